pub mod diagnostics;
pub mod http;
pub mod interactions;
pub mod lessons;
pub mod progress;
pub mod reviews;

pub use diagnostics::HttpDiagnosticAdapter;
pub use http::BackendClient;
pub use interactions::HttpInteractionAdapter;
pub use lessons::HttpLessonAdapter;
pub use progress::HttpProgressAdapter;
pub use reviews::HttpReviewAdapter;
