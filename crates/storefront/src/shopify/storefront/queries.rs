//! GraphQL operation definitions for the Shopify Storefront API.
//!
//! Each operation implements [`GraphQLQuery`] by hand: one module per
//! operation holds its document, `Variables` and `ResponseData`, and every
//! cart-returning operation selects the shared `CartFields` fragment so all of
//! them deserialize into the same [`CartFields`] shape.

use graphql_client::{GraphQLQuery, QueryBody};
use serde::{Deserialize, Serialize};

// Scalar types for the Shopify GraphQL schema.
#[allow(clippy::upper_case_acronyms)]
pub type DateTime = String;
#[allow(clippy::upper_case_acronyms)]
pub type Decimal = String;
#[allow(clippy::upper_case_acronyms)]
pub type URL = String;

/// Lines fetched per cart. Shopify caps a connection page at 250.
pub const CART_LINES_PAGE_SIZE: usize = 100;

macro_rules! cart_fields_fragment {
    () => {
        r"
fragment CartFields on Cart {
  id
  checkoutUrl
  createdAt
  updatedAt
  totalQuantity
  buyerIdentity { email phone }
  lines(first: 100) {
    edges {
      node {
        id
        quantity
        merchandise {
          __typename
          ... on ProductVariant {
            id
            title
            price { amount currencyCode }
            image { url altText }
            product { id title handle featuredImage { url altText } }
          }
        }
        cost { totalAmount { amount currencyCode } }
      }
    }
  }
  cost {
    subtotalAmount { amount currencyCode }
    totalAmount { amount currencyCode }
    totalTaxAmount { amount currencyCode }
  }
}
"
    };
}

macro_rules! graphql_operation {
    ($query:ident, $module:ident) => {
        impl GraphQLQuery for $query {
            type Variables = $module::Variables;
            type ResponseData = $module::ResponseData;

            fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
                QueryBody {
                    variables,
                    query: $module::QUERY,
                    operation_name: $module::OPERATION_NAME,
                }
            }
        }
    };
}

// =============================================================================
// Shared Response Shapes
// =============================================================================

/// `MoneyV2` selection.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoneyFields {
    pub amount: Decimal,
    pub currency_code: String,
}

/// `Image` selection.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageFields {
    pub url: URL,
    pub alt_text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyerIdentityFields {
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerchandiseProductFields {
    pub id: String,
    pub title: String,
    pub handle: String,
    pub featured_image: Option<ImageFields>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductVariantFields {
    pub id: String,
    pub title: String,
    pub price: MoneyFields,
    pub image: Option<ImageFields>,
    pub product: MerchandiseProductFields,
}

/// `Merchandise` union. Product variants are the only member Shopify defines.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "__typename")]
pub enum MerchandiseFields {
    ProductVariant(ProductVariantFields),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineCostFields {
    pub total_amount: MoneyFields,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CartLineFields {
    pub id: String,
    pub quantity: i64,
    pub merchandise: MerchandiseFields,
    pub cost: CartLineCostFields,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CartLineEdge {
    pub node: CartLineFields,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CartLineConnection {
    pub edges: Vec<CartLineEdge>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartCostFields {
    pub subtotal_amount: MoneyFields,
    pub total_amount: MoneyFields,
    pub total_tax_amount: Option<MoneyFields>,
}

/// `CartFields` fragment.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartFields {
    pub id: String,
    pub checkout_url: URL,
    pub created_at: DateTime,
    pub updated_at: DateTime,
    pub total_quantity: i64,
    pub buyer_identity: Option<BuyerIdentityFields>,
    pub lines: CartLineConnection,
    pub cost: CartCostFields,
}

/// `CartUserError` selection.
#[derive(Debug, Clone, Deserialize)]
pub struct CartUserErrorFields {
    pub field: Option<Vec<String>>,
    pub message: String,
}

/// Payload shared by cart mutations that return the full cart.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartMutationPayload {
    pub cart: Option<CartFields>,
    pub user_errors: Vec<CartUserErrorFields>,
}

// =============================================================================
// Input Objects
// =============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartBuyerIdentityInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_access_token: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineInput {
    pub merchandise_id: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CartLineUpdateInput {
    pub id: String,
    pub quantity: i64,
}

// =============================================================================
// Operations
// =============================================================================

pub struct CreateCart;

pub mod create_cart {
    use super::{CartBuyerIdentityInput, CartMutationPayload, Deserialize, Serialize};

    pub const OPERATION_NAME: &str = "CreateCart";
    pub const QUERY: &str = concat!(
        r"
mutation CreateCart($input: CartInput!) {
  cartCreate(input: $input) {
    cart { ...CartFields }
    userErrors { field message }
  }
}
",
        cart_fields_fragment!()
    );

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CartInput {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub buyer_identity: Option<CartBuyerIdentityInput>,
    }

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub input: CartInput,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_create: Option<CartMutationPayload>,
    }
}

graphql_operation!(CreateCart, create_cart);

pub struct GetCart;

pub mod get_cart {
    use super::{CartFields, Deserialize, Serialize};

    pub const OPERATION_NAME: &str = "GetCart";
    pub const QUERY: &str = concat!(
        r"
query GetCart($cartId: ID!) {
  cart(id: $cartId) { ...CartFields }
}
",
        cart_fields_fragment!()
    );

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub cart: Option<CartFields>,
    }
}

graphql_operation!(GetCart, get_cart);

pub struct AddToCart;

pub mod add_to_cart {
    use super::{CartLineInput, CartMutationPayload, Deserialize, Serialize};

    pub const OPERATION_NAME: &str = "AddToCart";
    pub const QUERY: &str = concat!(
        r"
mutation AddToCart($cartId: ID!, $lines: [CartLineInput!]!) {
  cartLinesAdd(cartId: $cartId, lines: $lines) {
    cart { ...CartFields }
    userErrors { field message }
  }
}
",
        cart_fields_fragment!()
    );

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
        pub lines: Vec<CartLineInput>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_lines_add: Option<CartMutationPayload>,
    }
}

graphql_operation!(AddToCart, add_to_cart);

pub struct UpdateCartLines;

pub mod update_cart_lines {
    use super::{CartLineUpdateInput, CartMutationPayload, Deserialize, Serialize};

    pub const OPERATION_NAME: &str = "UpdateCartLines";
    pub const QUERY: &str = concat!(
        r"
mutation UpdateCartLines($cartId: ID!, $lines: [CartLineUpdateInput!]!) {
  cartLinesUpdate(cartId: $cartId, lines: $lines) {
    cart { ...CartFields }
    userErrors { field message }
  }
}
",
        cart_fields_fragment!()
    );

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
        pub lines: Vec<CartLineUpdateInput>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_lines_update: Option<CartMutationPayload>,
    }
}

graphql_operation!(UpdateCartLines, update_cart_lines);

pub struct RemoveFromCart;

pub mod remove_from_cart {
    use super::{CartMutationPayload, Deserialize, Serialize};

    pub const OPERATION_NAME: &str = "RemoveFromCart";
    pub const QUERY: &str = concat!(
        r"
mutation RemoveFromCart($cartId: ID!, $lineIds: [ID!]!) {
  cartLinesRemove(cartId: $cartId, lineIds: $lineIds) {
    cart { ...CartFields }
    userErrors { field message }
  }
}
",
        cart_fields_fragment!()
    );

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
        pub line_ids: Vec<String>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_lines_remove: Option<CartMutationPayload>,
    }
}

graphql_operation!(RemoveFromCart, remove_from_cart);

pub struct UpdateBuyerIdentity;

pub mod update_buyer_identity {
    use super::{BuyerIdentityFields, CartUserErrorFields, Deserialize, Serialize, URL};

    pub const OPERATION_NAME: &str = "UpdateBuyerIdentity";
    pub const QUERY: &str = r"
mutation UpdateBuyerIdentity($cartId: ID!, $buyerIdentity: CartBuyerIdentityInput!) {
  cartBuyerIdentityUpdate(cartId: $cartId, buyerIdentity: $buyerIdentity) {
    cart {
      id
      checkoutUrl
      buyerIdentity { email phone }
    }
    userErrors { field message }
  }
}
";

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
        pub buyer_identity: super::CartBuyerIdentityInput,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct IdentityCart {
        pub id: String,
        pub checkout_url: URL,
        pub buyer_identity: Option<BuyerIdentityFields>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Payload {
        pub cart: Option<IdentityCart>,
        pub user_errors: Vec<CartUserErrorFields>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_buyer_identity_update: Option<Payload>,
    }
}

graphql_operation!(UpdateBuyerIdentity, update_buyer_identity);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_operations_include_fragment() {
        for query in [
            create_cart::QUERY,
            get_cart::QUERY,
            add_to_cart::QUERY,
            update_cart_lines::QUERY,
            remove_from_cart::QUERY,
        ] {
            assert!(query.contains("...CartFields"));
            assert!(query.contains("fragment CartFields on Cart"));
        }
        assert!(!update_buyer_identity::QUERY.contains("CartFields"));
    }

    #[test]
    fn test_fragment_page_size_matches_constant() {
        assert!(get_cart::QUERY.contains(&format!("lines(first: {CART_LINES_PAGE_SIZE})")));
    }

    #[test]
    fn test_build_query_serializes_variables() {
        let body = AddToCart::build_query(add_to_cart::Variables {
            cart_id: "gid://shopify/Cart/1".to_string(),
            lines: vec![CartLineInput {
                merchandise_id: "gid://shopify/ProductVariant/9".to_string(),
                quantity: 2,
            }],
        });
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["operationName"], "AddToCart");
        assert_eq!(json["variables"]["cartId"], "gid://shopify/Cart/1");
        assert_eq!(
            json["variables"]["lines"][0]["merchandiseId"],
            "gid://shopify/ProductVariant/9"
        );
        assert_eq!(json["variables"]["lines"][0]["quantity"], 2);
    }

    #[test]
    fn test_create_cart_omits_empty_buyer_identity() {
        let body = CreateCart::build_query(create_cart::Variables {
            input: create_cart::CartInput {
                buyer_identity: None,
            },
        });
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["variables"]["input"], serde_json::json!({}));
    }

    #[test]
    fn test_deserialize_cart_fields() {
        let raw = serde_json::json!({
            "id": "gid://shopify/Cart/abc",
            "checkoutUrl": "https://shop.example/cart/c/abc",
            "createdAt": "2025-01-01T00:00:00Z",
            "updatedAt": "2025-01-01T00:00:00Z",
            "totalQuantity": 2,
            "buyerIdentity": { "email": null, "phone": null },
            "lines": { "edges": [{ "node": {
                "id": "gid://shopify/CartLine/1",
                "quantity": 2,
                "merchandise": {
                    "__typename": "ProductVariant",
                    "id": "gid://shopify/ProductVariant/9",
                    "title": "Large",
                    "price": { "amount": "10.0", "currencyCode": "USD" },
                    "image": null,
                    "product": {
                        "id": "gid://shopify/Product/3",
                        "title": "Tee",
                        "handle": "tee",
                        "featuredImage": { "url": "https://cdn/x.png", "altText": null }
                    }
                },
                "cost": { "totalAmount": { "amount": "20.0", "currencyCode": "USD" } }
            }}]},
            "cost": {
                "subtotalAmount": { "amount": "20.0", "currencyCode": "USD" },
                "totalAmount": { "amount": "20.0", "currencyCode": "USD" },
                "totalTaxAmount": null
            }
        });

        let cart: CartFields = serde_json::from_value(raw).unwrap();
        assert_eq!(cart.total_quantity, 2);
        assert_eq!(cart.lines.edges.len(), 1);
        let MerchandiseFields::ProductVariant(variant) = &cart.lines.edges[0].node.merchandise;
        assert_eq!(variant.product.handle, "tee");
        assert!(cart.cost.total_tax_amount.is_none());
    }
}
