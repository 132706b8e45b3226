//! Checkout module.
//!
//! Contains session types, the session initiator, and the return-page
//! reconciliation.

mod initiator;
mod reconcile;
mod session;

pub use initiator::{CheckoutInitiator, CheckoutStarted, Navigator, RecordingNavigator};
pub use reconcile::{
    CancelOutcome, CommitOutcome, OrderItem, OrderSummary, Reconciler, SuccessOutcome,
    SummarySource, CANCELED_MESSAGE, RELEASED_MESSAGE, RELEASE_FAILED_MESSAGE, STATUS_CONFIRMED,
    STATUS_PENDING,
};
pub use session::{
    session_token, BuyNowRequest, CartCheckoutRequest, CheckoutItem, CheckoutRedirect, ReturnUrls,
    SessionDetails, SessionLineItem, SessionState, ShippingAddress, ShippingDetails,
    SESSION_ID_PLACEHOLDER, SESSION_TOKEN_KEY,
};
