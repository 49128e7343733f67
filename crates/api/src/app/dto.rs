use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_auth::{Role, Session, UserAccount};
use stockroom_catalog::{Category, StockLevel};
use stockroom_core::{CategoryId, ProductId, SessionId, TransactionId, UserId};
use stockroom_infra::{AppliedTransaction, ProductView, SignedIn};
use stockroom_inventory::{Direction, InventoryTransaction};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ProductRequest {
    pub name: String,
    pub category_id: i64,
    /// Smallest currency unit.
    pub price: i64,
    #[serde(default)]
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct TransactionRequest {
    pub product_id: i64,
    #[serde(rename = "type")]
    pub direction: String,
    pub quantity: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct CategoryListQuery {
    pub sort: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductListQuery {
    pub search: Option<String>,
    pub category_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TransactionListQuery {
    pub product_id: Option<String>,
    pub limit: Option<String>,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: UserId,
    pub email: String,
    pub roles: Vec<Role>,
    pub created_at: DateTime<Utc>,
}

impl From<UserAccount> for UserResponse {
    fn from(u: UserAccount) -> Self {
        Self {
            id: u.id,
            email: u.email,
            roles: u.roles,
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SignUpResponse {
    pub user_id: UserId,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct SignInResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_at: DateTime<Utc>,
    pub user: UserResponse,
}

impl From<SignedIn> for SignInResponse {
    fn from(s: SignedIn) -> Self {
        Self {
            access_token: s.access_token,
            token_type: "bearer",
            expires_at: s.expires_at,
            user: s.user.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: SessionId,
    pub expires_at: DateTime<Utc>,
    pub user: UserResponse,
}

impl SessionResponse {
    pub fn new(session: Session, user: UserAccount) -> Self {
        Self {
            session_id: session.id,
            expires_at: session.expires_at,
            user: user.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub id: CategoryId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<Category> for CategoryResponse {
    fn from(c: Category) -> Self {
        Self {
            id: c.id,
            name: c.name,
            created_at: c.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub id: ProductId,
    pub name: String,
    pub category_id: CategoryId,
    pub category_name: String,
    pub price: i64,
    pub quantity: i64,
    pub stock_level: StockLevel,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProductView> for ProductResponse {
    fn from(v: ProductView) -> Self {
        let p = v.product;
        Self {
            id: p.id,
            name: p.name,
            category_id: p.category_id,
            category_name: v.category_name,
            price: p.unit_price,
            quantity: p.quantity,
            stock_level: v.stock_level,
            version: p.version,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    pub id: TransactionId,
    pub product_id: ProductId,
    pub product_name: Option<String>,
    #[serde(rename = "type")]
    pub direction: Direction,
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
}

impl TransactionResponse {
    pub fn new(t: InventoryTransaction, product_name: Option<String>) -> Self {
        Self {
            id: t.id,
            product_id: t.product_id,
            product_name,
            direction: t.direction,
            quantity: t.quantity.get(),
            created_at: t.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AppliedTransactionResponse {
    pub transaction: TransactionResponse,
    pub new_quantity: i64,
}

impl AppliedTransactionResponse {
    pub fn new(applied: AppliedTransaction, product_name: Option<String>) -> Self {
        Self {
            transaction: TransactionResponse::new(applied.transaction, product_name),
            new_quantity: applied.new_quantity,
        }
    }
}
