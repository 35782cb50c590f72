//! Form payloads exactly as the browser submits them.
//!
//! Every field is a plain string with a default so that a missing field
//! turns into a validation message instead of a decoding failure.

use serde::{Deserialize, Serialize};

/// Submitted post form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PostFormData {
    pub title: String,
    pub text: String,
    pub pub_date: String,
    pub category: String,
    pub location: String,
}

/// Submitted comment form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentFormData {
    pub text: String,
}

/// Submitted profile edit form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileFormData {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// Submitted sign-up form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationFormData {
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password1: String,
    #[serde(skip_serializing)]
    pub password2: String,
}

/// Submitted login form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginFormData {
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
}
