pub mod notifications;
pub mod razorpay;
