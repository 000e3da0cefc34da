pub mod error;
pub mod executor;
pub mod query;
pub mod refusal;
pub mod request;
pub mod response;
pub mod retry;
pub mod transport;

pub use error::ExecutorError;
pub use executor::HttpExecutor;
pub use refusal::RefusalRule;
pub use request::{Method, RequestSpec};
pub use response::HttpResponse;
pub use retry::{RetryDecision, RetryMode, RetryPolicy};
pub use transport::{ReqwestTransport, Transport, TransportFuture};
