//! Testing utilities for splitgate
//!
//! - [`fixtures`] - canned upstream bodies, settings and a wired application state
//! - [`mock`] - in-process authorization server and expense API
//!
//! ```rust,ignore
//! use splitgate::testing::{fixtures::TestFixtures, mock::MockExpenseApi};
//!
//! let api = MockExpenseApi::new().with_response("get_groups", TestFixtures::groups_body());
//! ```

pub mod fixtures;
pub mod mock;

pub use fixtures::{TestFixtures, TestState};
pub use mock::{MockAuthorizationProvider, MockExpenseApi};

/// Common test constants
pub mod constants {
    /// SPA origin used by test settings
    pub const TEST_SPA_ORIGIN: &str = "http://localhost:4200";

    /// Authorization page of the mock provider
    pub const MOCK_AUTHORIZE_URL: &str = "https://auth.splitgate.test/oauth/authorize";

    /// The only verifier the mock provider accepts
    pub const MOCK_VERIFIER: &str = "mock-verifier";

    /// User id the mock expense API reports by default
    pub const TEST_USER_ID: u64 = 42;
}
