pub(crate) mod answers;
pub(crate) mod controller;
pub(crate) mod machine;
pub(crate) mod order;
pub(crate) mod presenter;
pub(crate) mod session;
pub(crate) mod submission;
pub(crate) mod warnings;
