//! `studyagora-kernel` — contracts shared by the StudyAgora gateway runtime.
//!
//! Nothing in this crate performs network I/O. It defines:
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`model`] | [`ModelClient`](model::ModelClient) trait, [`ModelRequest`](model::ModelRequest), the upstream error taxonomy |
//! | [`exam`] | Evaluation / quiz request DTOs, field validation, the structured [`EvaluationReport`](exam::EvaluationReport) |
//! | [`auth`] | [`Principal`](auth::Principal), session claims and the session state machine |
//! | [`gateway`] | Filter trait, request context, access-policy settings and their validation |
//! | [`config`] | Layered configuration loading (file + environment) |

pub mod auth;
pub mod config;
pub mod exam;
pub mod gateway;
pub mod model;
