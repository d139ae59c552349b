//! In-memory stand-ins for Shopify used by unit and router tests.

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::SecretString;

use headless_bff_core::CustomerId;

use crate::config::{AuthConfig, BffConfig, LogFormat, ShopifyConfig};
use crate::services::auth::TokenService;
use crate::services::cart::CartSessionManager;
use crate::shopify::{
    BuyerIdentityInput, Cart, CartApi, CartBuyerIdentity, CartCost, CartIdentity, CartLine,
    CartLineInput, CartLineUpdateInput, CartMerchandise, CartMerchandiseProduct,
    CustomerMetafieldStore, Image, Metafield, MetafieldInput, Money, ShopifyError,
};
use crate::state::AppState;

pub const TEST_CLIENT_ID: &str = "storefront-web";
pub const TEST_CLIENT_SECRET: &str = "Vt5!cQ9#mL2@xR7$";
pub const TEST_JWT_SECRET: &str = "Jq7#Pz2!Lx9@Vm4$Tr8%Wk3^Nd6&Hb1*";

pub const VARIANT_A: &str = "gid://shopify/ProductVariant/1001";
pub const VARIANT_B: &str = "gid://shopify/ProductVariant/1002";
pub const VARIANT_C: &str = "gid://shopify/ProductVariant/1003";

/// Token that the fake backend refuses in buyer identity updates.
pub const REJECTED_CUSTOMER_TOKEN: &str = "expired";

pub fn test_config() -> BffConfig {
    BffConfig {
        host: "127.0.0.1".parse().unwrap(),
        port: 3000,
        shopify: ShopifyConfig {
            store: "test-shop.myshopify.com".to_string(),
            api_version: "2025-01".to_string(),
            storefront_token: SecretString::from("storefront-token"),
            admin_token: SecretString::from("admin-token"),
        },
        auth: AuthConfig {
            jwt_secret: SecretString::from(TEST_JWT_SECRET),
            client_id: TEST_CLIENT_ID.to_string(),
            client_secret: SecretString::from(TEST_CLIENT_SECRET),
            token_cache_ttl: Duration::from_secs(43_200),
            token_lifetime: Duration::from_secs(86_400),
        },
        http_timeout: Duration::from_secs(30),
        cors_allowed_origins: Vec::new(),
        log_format: LogFormat::Pretty,
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// Application state over fresh in-memory backends.
pub fn test_state() -> (AppState, Arc<MemoryCartApi>, Arc<MemoryMetafields>) {
    let config = test_config();
    let carts = Arc::new(MemoryCartApi::default());
    let metafields = Arc::new(MemoryMetafields::default());
    let manager = CartSessionManager::new(carts.clone(), metafields.clone());
    let tokens = TokenService::new(config.auth.clone());
    (AppState::from_parts(config, manager, tokens), carts, metafields)
}

fn unavailable() -> ShopifyError {
    ShopifyError::Status {
        status: 503,
        body: "service unavailable".to_string(),
    }
}

// =============================================================================
// Cart backend
// =============================================================================

struct Variant {
    title: &'static str,
    price: f64,
    product_id: &'static str,
    product_title: &'static str,
    handle: &'static str,
}

fn catalog(variant_id: &str) -> Option<Variant> {
    let variant = match variant_id {
        VARIANT_A => Variant {
            title: "Small",
            price: 12.5,
            product_id: "gid://shopify/Product/1",
            product_title: "Pineapple Tee",
            handle: "pineapple-tee",
        },
        VARIANT_B => Variant {
            title: "Default Title",
            price: 8.0,
            product_id: "gid://shopify/Product/2",
            product_title: "Sticker Pack",
            handle: "sticker-pack",
        },
        VARIANT_C => Variant {
            title: "Large",
            price: 30.25,
            product_id: "gid://shopify/Product/3",
            product_title: "Hoodie",
            handle: "hoodie",
        },
        _ => return None,
    };
    Some(variant)
}

#[derive(Default)]
struct CartStore {
    carts: HashMap<String, Cart>,
    next_id: u64,
    created: usize,
    fetches: usize,
}

impl CartStore {
    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn cart_mut(&mut self, cart_id: &str) -> Result<&mut Cart, ShopifyError> {
        self.carts
            .get_mut(cart_id)
            .ok_or_else(|| ShopifyError::UserError("The specified cart does not exist.".to_string()))
    }
}

/// Shopify-like cart backend: prices come from a fixed catalog and totals
/// are recomputed after every mutation.
#[derive(Default)]
pub struct MemoryCartApi {
    store: Mutex<CartStore>,
    fail_creates: AtomicBool,
}

impl MemoryCartApi {
    pub fn fail_creates(&self, fail: bool) {
        self.fail_creates.store(fail, Ordering::SeqCst);
    }

    /// Carts created so far.
    pub fn created(&self) -> usize {
        self.store.lock().unwrap().created
    }

    /// `get_cart` calls so far.
    pub fn fetches(&self) -> usize {
        self.store.lock().unwrap().fetches
    }

    pub fn buyer_email(&self, cart_id: &str) -> Option<String> {
        self.store
            .lock()
            .unwrap()
            .carts
            .get(cart_id)
            .and_then(|c| c.buyer_identity.as_ref())
            .and_then(|b| b.email.clone())
    }
}

fn recompute(cart: &mut Cart) {
    let mut subtotal = 0.0;
    for line in &mut cart.lines {
        #[allow(clippy::cast_precision_loss)]
        let amount = line.merchandise.price.amount * line.quantity as f64;
        line.total = Money::new(amount, "USD");
        subtotal += amount;
    }
    cart.total_quantity = cart.lines.iter().map(|l| l.quantity).sum();
    cart.cost = CartCost {
        subtotal: Money::new(subtotal, "USD"),
        total: Money::new(subtotal, "USD"),
        total_tax: None,
    };
    cart.updated_at = "2025-01-01T00:05:00Z".to_string();
}

#[async_trait]
impl CartApi for MemoryCartApi {
    async fn create_cart(
        &self,
        buyer_identity: Option<BuyerIdentityInput>,
    ) -> Result<Cart, ShopifyError> {
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(unavailable());
        }

        let mut store = self.store.lock().unwrap();
        let n = store.next();
        let id = format!("gid://shopify/Cart/test-{n}");
        let cart = Cart {
            checkout_url: format!("https://test-shop.myshopify.com/cart/c/test-{n}"),
            created_at: "2025-01-01T00:00:00Z".to_string(),
            updated_at: "2025-01-01T00:00:00Z".to_string(),
            total_quantity: 0,
            buyer_identity: Some(CartBuyerIdentity {
                email: buyer_identity.and_then(|b| b.email),
                phone: None,
            }),
            cost: CartCost {
                subtotal: Money::new(0.0, "USD"),
                total: Money::new(0.0, "USD"),
                total_tax: None,
            },
            lines: Vec::new(),
            id: id.clone(),
        };
        store.carts.insert(id, cart.clone());
        store.created += 1;
        Ok(cart)
    }

    async fn get_cart(&self, cart_id: &str) -> Result<Cart, ShopifyError> {
        let mut store = self.store.lock().unwrap();
        store.fetches += 1;
        store
            .carts
            .get(cart_id)
            .cloned()
            .ok_or_else(|| ShopifyError::NotFound(format!("Cart not found: {cart_id}")))
    }

    async fn add_lines(
        &self,
        cart_id: &str,
        lines: Vec<CartLineInput>,
    ) -> Result<Cart, ShopifyError> {
        let mut store = self.store.lock().unwrap();
        let mut new_lines = Vec::with_capacity(lines.len());
        for line in lines {
            let variant = catalog(&line.merchandise_id).ok_or_else(|| {
                ShopifyError::UserError(format!(
                    "The merchandise with id {} does not exist.",
                    line.merchandise_id
                ))
            })?;
            let n = store.next();
            new_lines.push(CartLine {
                id: format!("gid://shopify/CartLine/line-{n}"),
                quantity: line.quantity,
                total: Money::new(0.0, "USD"),
                merchandise: CartMerchandise {
                    id: line.merchandise_id,
                    title: variant.title.to_string(),
                    price: Money::new(variant.price, "USD"),
                    image: None,
                    product: CartMerchandiseProduct {
                        id: variant.product_id.to_string(),
                        title: variant.product_title.to_string(),
                        handle: variant.handle.to_string(),
                        featured_image: Some(Image {
                            url: format!("https://cdn.test/{}.png", variant.handle),
                            alt_text: None,
                        }),
                    },
                },
            });
        }

        let cart = store.cart_mut(cart_id)?;
        cart.lines.extend(new_lines);
        recompute(cart);
        Ok(cart.clone())
    }

    async fn update_lines(
        &self,
        cart_id: &str,
        lines: Vec<CartLineUpdateInput>,
    ) -> Result<Cart, ShopifyError> {
        let mut store = self.store.lock().unwrap();
        let cart = store.cart_mut(cart_id)?;
        for update in lines {
            let line = cart
                .lines
                .iter_mut()
                .find(|l| l.id == update.id)
                .ok_or_else(|| {
                    ShopifyError::UserError(format!(
                        "The merchandise line with id {} does not exist.",
                        update.id
                    ))
                })?;
            line.quantity = update.quantity;
        }
        cart.lines.retain(|l| l.quantity > 0);
        recompute(cart);
        Ok(cart.clone())
    }

    async fn remove_lines(
        &self,
        cart_id: &str,
        line_ids: Vec<String>,
    ) -> Result<Cart, ShopifyError> {
        let mut store = self.store.lock().unwrap();
        let cart = store.cart_mut(cart_id)?;
        if let Some(missing) = line_ids.iter().find(|id| !cart.lines.iter().any(|l| &l.id == *id)) {
            return Err(ShopifyError::UserError(format!(
                "The merchandise line with id {missing} does not exist."
            )));
        }
        cart.lines.retain(|l| !line_ids.contains(&l.id));
        recompute(cart);
        Ok(cart.clone())
    }

    async fn update_buyer_identity(
        &self,
        cart_id: &str,
        customer_access_token: &str,
    ) -> Result<CartIdentity, ShopifyError> {
        if customer_access_token == REJECTED_CUSTOMER_TOKEN {
            return Err(ShopifyError::UserError(
                "Customer access token is invalid".to_string(),
            ));
        }

        let mut store = self.store.lock().unwrap();
        let cart = store.cart_mut(cart_id)?;
        let identity = CartBuyerIdentity {
            email: Some("customer@example.com".to_string()),
            phone: None,
        };
        cart.buyer_identity = Some(identity.clone());
        Ok(CartIdentity {
            id: cart.id.clone(),
            checkout_url: format!("{}?logged_in=true", cart.checkout_url),
            buyer_identity: identity,
        })
    }
}

// =============================================================================
// Metafield store
// =============================================================================

/// Customer metafields keyed by customer, with switchable failures.
#[derive(Default)]
pub struct MemoryMetafields {
    entries: Mutex<HashMap<(CustomerId, String, String), Metafield>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryMetafields {
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Seed the customer's cart ID.
    pub fn set(&self, customer: CustomerId, cart_id: &str) {
        let mut entries = self.entries.lock().unwrap();
        let id = i64::try_from(entries.len()).unwrap() + 1;
        entries.insert(
            (customer, "custom".to_string(), "cart_id".to_string()),
            Metafield {
                id,
                namespace: "custom".to_string(),
                key: "cart_id".to_string(),
                value: cart_id.to_string(),
                kind: "single_line_text_field".to_string(),
            },
        );
    }

    /// The customer's stored cart ID.
    pub fn value(&self, customer: CustomerId) -> Option<String> {
        self.entries
            .lock()
            .unwrap()
            .get(&(customer, "custom".to_string(), "cart_id".to_string()))
            .map(|m| m.value.clone())
    }
}

#[async_trait]
impl CustomerMetafieldStore for MemoryMetafields {
    async fn find_metafield(
        &self,
        customer: CustomerId,
        namespace: &str,
        key: &str,
    ) -> Result<Option<Metafield>, ShopifyError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(self
            .entries
            .lock()
            .unwrap()
            .get(&(customer, namespace.to_string(), key.to_string()))
            .cloned())
    }

    async fn upsert_metafield(
        &self,
        customer: CustomerId,
        input: &MetafieldInput,
    ) -> Result<Metafield, ShopifyError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        let mut entries = self.entries.lock().unwrap();
        let next_id = i64::try_from(entries.len()).unwrap() + 1;
        let entry = entries
            .entry((customer, input.namespace.clone(), input.key.clone()))
            .or_insert_with(|| Metafield {
                id: next_id,
                namespace: input.namespace.clone(),
                key: input.key.clone(),
                value: String::new(),
                kind: input.kind.clone(),
            });
        entry.value.clone_from(&input.value);
        Ok(entry.clone())
    }
}
