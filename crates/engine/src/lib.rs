//! Query routing engine for Helpline.
//!
//! Every customer question goes through the same pipeline:
//!
//! 1. **Build** a classification query (question + recent conversation)
//! 2. **Classify category** and narrow the knowledge index
//! 3. **Classify context** against the context catalog
//! 4. **Fetch** customer data for that single context
//! 5. **Assemble** the system prompt
//! 6. **Answer** with the system prompt, the conversation window and the question
//! 7. **Append** the exchange to the window
//!
//! Failures at 2, 3 or 6 abort the request and leave the window untouched.
//! A classification that matches nothing is not a failure: the router falls
//! back to the full knowledge index and sends no customer data.

pub mod classifier;
pub mod prompt;
pub mod router;
pub mod session;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use classifier::{Classifier, classification_query};
pub use prompt::PromptAssembler;
pub use router::{RoutedAnswer, Router, RouterSettings, RoutingPlan};
pub use session::{SessionStore, SharedWindow};
