//! Tier-specific offer emails, sent only with the applicant's consent.

pub mod dispatcher;
pub mod email;
pub mod templates;
pub mod transport;

pub use dispatcher::{DispatchOutcome, NotificationDispatcher, NotificationError};
pub use email::is_valid_email;
pub use templates::{render, TemplateCatalog, TEMPLATE_MAP};
pub use transport::{
    DeliveryReceipt, MailTransport, OutboundEmail, SendGridTransport, TransportError,
};
