pub mod fake;
pub mod users;

use crate::testing::TestCase;

/// Every registered case, in execution order.
pub fn all() -> Vec<TestCase> {
    users::cases()
}
