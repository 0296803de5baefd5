// Service exports
pub mod cache;
pub mod credentials;
pub mod geocoding;
pub mod payment;
pub mod postgres;

pub use cache::{CacheError, CacheKey, CacheManager};
pub use credentials::{Claims, CredentialError, CredentialService};
pub use geocoding::{normalize_postal_code, GeocodingClient, GeocodingError};
pub use payment::{CheckoutPreference, GatewayPayment, PaymentClient, PaymentError, PreferenceItem};
pub use postgres::{NewCompanyAccount, NewUser, PostgresClient, PostgresError};
