//! Form validation.
//!
//! Each `clean_*` function turns a raw payload into a typed draft or a set
//! of field errors. Checks that need storage (foreign keys, uniqueness) are
//! done by the caller, which adds to the same [`FormErrors`].

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;

mod data;

pub use data::{
    CommentFormData, LoginFormData, PostFormData, ProfileFormData, RegistrationFormData,
};

use crate::domain::{Id, Post, User};

pub const TITLE_MAX_LEN: usize = 256;
pub const USERNAME_MAX_LEN: usize = 150;
pub const NAME_MAX_LEN: usize = 150;
pub const PASSWORD_MIN_LEN: usize = 8;
pub const SLUG_MAX_LEN: usize = 64;

/// Key for errors that belong to the form as a whole.
pub const NON_FIELD_ERRORS: &str = "__all__";

const REQUIRED: &str = "This field is required.";

/// Field name to messages. Serializes as a plain map for templates.
#[derive(Debug, Clone, Default, Serialize, thiserror::Error)]
#[serde(transparent)]
#[error("form has {} invalid field(s)", .0.len())]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// `Ok(value)` when no error was recorded.
    pub fn into_result<T>(self, value: T) -> Result<T, FormErrors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }

    fn require<'a>(&mut self, field: &str, value: &'a str) -> &'a str {
        let value = value.trim();
        if value.is_empty() {
            self.add(field, REQUIRED);
        }
        value
    }

    fn max_len(&mut self, field: &str, value: &str, max: usize) {
        let len = value.chars().count();
        if len > max {
            self.add(
                field,
                format!("Ensure this value has at most {max} characters (it has {len})."),
            );
        }
    }
}

/// A validated post form. Category and location ids still have to be
/// checked against storage.
#[derive(Debug, Clone, PartialEq)]
pub struct PostDraft {
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub category_id: Id,
    pub location_id: Option<Id>,
}

impl PostDraft {
    pub fn apply_to(self, post: &mut Post) {
        post.title = self.title;
        post.text = self.text;
        post.pub_date = self.pub_date;
        post.category_id = self.category_id;
        post.location_id = self.location_id;
    }
}

pub fn clean_post(data: &PostFormData) -> Result<PostDraft, FormErrors> {
    let mut errors = FormErrors::new();

    let title = errors.require("title", &data.title).to_string();
    errors.max_len("title", &title, TITLE_MAX_LEN);
    let text = errors.require("text", &data.text).to_string();

    let raw_date = errors.require("pub_date", &data.pub_date);
    let pub_date = if raw_date.is_empty() {
        None
    } else {
        let parsed = parse_pub_date(raw_date);
        if parsed.is_none() {
            errors.add("pub_date", "Enter a valid date/time.");
        }
        parsed
    };

    let raw_category = errors.require("category", &data.category);
    let category_id = if raw_category.is_empty() {
        None
    } else {
        let parsed = parse_choice(raw_category);
        if parsed.is_none() {
            errors.add("category", "Select a valid choice.");
        }
        parsed
    };

    let raw_location = data.location.trim();
    let location_id = if raw_location.is_empty() {
        None
    } else {
        let parsed = parse_choice(raw_location);
        if parsed.is_none() {
            errors.add("location", "Select a valid choice.");
        }
        parsed
    };

    match (pub_date, category_id) {
        (Some(pub_date), Some(category_id)) if errors.is_empty() => Ok(PostDraft {
            title,
            text,
            pub_date,
            category_id,
            location_id,
        }),
        _ => Err(errors),
    }
}

/// Form values for editing an existing post.
pub fn post_initial(post: &Post) -> PostFormData {
    PostFormData {
        title: post.title.clone(),
        text: post.text.clone(),
        pub_date: post.pub_date.format("%Y-%m-%dT%H:%M").to_string(),
        category: post.category_id.to_string(),
        location: post.location_id.map(|id| id.to_string()).unwrap_or_default(),
    }
}

/// Accepts `datetime-local` values (with or without seconds) and plain
/// dates, which mean midnight. All values are read as UTC.
fn parse_pub_date(raw: &str) -> Option<DateTime<Utc>> {
    const FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%d %H:%M:%S",
    ];

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc())
}

fn parse_choice(raw: &str) -> Option<Id> {
    raw.parse::<Id>().ok().filter(|id| *id > 0)
}

/// A validated comment form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentDraft {
    pub text: String,
}

pub fn clean_comment(data: &CommentFormData) -> Result<CommentDraft, FormErrors> {
    let mut errors = FormErrors::new();
    let text = errors.require("text", &data.text).to_string();
    errors.into_result(CommentDraft { text })
}

/// Validated profile changes. Username uniqueness is checked by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileChanges {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl ProfileChanges {
    pub fn apply_to(self, user: &mut User) {
        user.username = self.username;
        user.first_name = self.first_name;
        user.last_name = self.last_name;
        user.email = self.email;
    }
}

pub fn clean_profile(data: &ProfileFormData) -> Result<ProfileChanges, FormErrors> {
    let mut errors = FormErrors::new();

    let username = check_username(&mut errors, &data.username);
    let first_name = data.first_name.trim().to_string();
    errors.max_len("first_name", &first_name, NAME_MAX_LEN);
    let last_name = data.last_name.trim().to_string();
    errors.max_len("last_name", &last_name, NAME_MAX_LEN);
    let email = check_email(&mut errors, &data.email);

    errors.into_result(ProfileChanges {
        username,
        first_name,
        last_name,
        email,
    })
}

pub fn profile_initial(user: &User) -> ProfileFormData {
    ProfileFormData {
        username: user.username.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        email: user.email.clone(),
    }
}

/// A validated sign-up. The password is still plain text at this point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

pub fn clean_registration(data: &RegistrationFormData) -> Result<Registration, FormErrors> {
    let mut errors = FormErrors::new();

    let username = check_username(&mut errors, &data.username);
    let email = check_email(&mut errors, &data.email);

    if data.password1.is_empty() {
        errors.add("password1", REQUIRED);
    } else {
        if data.password1.chars().count() < PASSWORD_MIN_LEN {
            errors.add(
                "password1",
                format!("This password is too short. It must contain at least {PASSWORD_MIN_LEN} characters."),
            );
        }
        if data.password1.chars().all(|c| c.is_ascii_digit()) {
            errors.add("password1", "This password is entirely numeric.");
        }
        if !username.is_empty() && data.password1.eq_ignore_ascii_case(&username) {
            errors.add("password1", "The password is too similar to the username.");
        }
    }
    if data.password2.is_empty() {
        errors.add("password2", REQUIRED);
    } else if data.password1 != data.password2 {
        errors.add("password2", "The two password fields didn't match.");
    }

    errors.into_result(Registration {
        username,
        email,
        password: data.password1.clone(),
    })
}

/// Login credentials with both fields present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

pub fn clean_login(data: &LoginFormData) -> Result<Credentials, FormErrors> {
    let mut errors = FormErrors::new();
    let username = errors.require("username", &data.username).to_string();
    if data.password.is_empty() {
        errors.add("password", REQUIRED);
    }
    errors.into_result(Credentials {
        username,
        password: data.password.clone(),
    })
}

fn check_username(errors: &mut FormErrors, raw: &str) -> String {
    let username = errors.require("username", raw).to_string();
    errors.max_len("username", &username, USERNAME_MAX_LEN);
    if !username.is_empty() && !is_valid_username(&username) {
        errors.add(
            "username",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        );
    }
    username
}

fn check_email(errors: &mut FormErrors, raw: &str) -> String {
    let email = raw.trim().to_string();
    if !email.is_empty() && !is_valid_email(&email) {
        errors.add("email", "Enter a valid email address.");
    }
    email
}

pub fn is_valid_username(username: &str) -> bool {
    username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '@' | '+' | '-'))
}

/// Latin letters, digits, hyphens and underscores; used in category URLs.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug.chars().count() <= SLUG_MAX_LEN
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-'))
}

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.rsplit_once('@') else {
        return false;
    };
    !local.is_empty()
        && !email.chars().any(char::is_whitespace)
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone, Timelike};

    fn post_data() -> PostFormData {
        PostFormData {
            title: "Holiday".into(),
            text: "We went to the sea.".into(),
            pub_date: "2024-05-01T10:30".into(),
            category: "3".into(),
            location: String::new(),
        }
    }

    #[test]
    fn test_clean_post_success() {
        let draft = clean_post(&post_data()).unwrap();
        assert_eq!(draft.title, "Holiday");
        assert_eq!(draft.category_id, 3);
        assert_eq!(draft.location_id, None);
        assert_eq!(draft.pub_date, Utc.with_ymd_and_hms(2024, 5, 1, 10, 30, 0).unwrap());
    }

    #[test]
    fn test_clean_post_accepts_plain_date() {
        let mut data = post_data();
        data.pub_date = "2030-01-02".into();
        let draft = clean_post(&data).unwrap();
        assert_eq!(draft.pub_date.year(), 2030);
        assert_eq!(draft.pub_date.hour(), 0);
    }

    #[test]
    fn test_clean_post_reports_every_bad_field() {
        let data = PostFormData {
            title: "x".repeat(TITLE_MAX_LEN + 1),
            text: "   ".into(),
            pub_date: "yesterday".into(),
            category: String::new(),
            location: "abc".into(),
        };
        let errors = clean_post(&data).unwrap_err();
        for field in ["title", "text", "pub_date", "category", "location"] {
            assert!(errors.has(field), "missing error for {field}");
        }
    }

    #[test]
    fn test_post_initial_prefills_edit_form() {
        let mut post = Post::new(
            1,
            "Title".into(),
            "Body".into(),
            Utc.with_ymd_and_hms(2024, 5, 1, 10, 30, 0).unwrap(),
            4,
            Some(9),
        );
        post.id = 2;
        let initial = post_initial(&post);
        assert_eq!(initial.pub_date, "2024-05-01T10:30");
        assert_eq!(initial.category, "4");
        assert_eq!(initial.location, "9");
        assert_eq!(clean_post(&initial).unwrap().location_id, Some(9));
    }

    #[test]
    fn test_clean_comment_requires_text() {
        let errors = clean_comment(&CommentFormData { text: "  ".into() }).unwrap_err();
        assert_eq!(errors.get("text"), Some(&[REQUIRED.to_string()][..]));
        assert_eq!(
            clean_comment(&CommentFormData { text: " nice ".into() }).unwrap().text,
            "nice"
        );
    }

    #[test]
    fn test_clean_profile_validates_username_and_email() {
        let errors = clean_profile(&ProfileFormData {
            username: "bad name".into(),
            first_name: String::new(),
            last_name: String::new(),
            email: "not-an-email".into(),
        })
        .unwrap_err();
        assert!(errors.has("username"));
        assert!(errors.has("email"));

        let changes = clean_profile(&ProfileFormData {
            username: "alice.b".into(),
            first_name: "Alice".into(),
            last_name: String::new(),
            email: String::new(),
        })
        .unwrap();
        assert_eq!(changes.username, "alice.b");
    }

    #[test]
    fn test_clean_registration_password_rules() {
        let base = RegistrationFormData {
            username: "carol".into(),
            email: "carol@example.com".into(),
            password1: "s3cret-pass".into(),
            password2: "s3cret-pass".into(),
        };
        assert!(clean_registration(&base).is_ok());

        let mut mismatch = base.clone();
        mismatch.password2 = "other-pass".into();
        assert!(clean_registration(&mismatch).unwrap_err().has("password2"));

        let mut numeric = base.clone();
        numeric.password1 = "12345678".into();
        numeric.password2 = "12345678".into();
        assert!(clean_registration(&numeric).unwrap_err().has("password1"));

        let mut short = base;
        short.password1 = "abc".into();
        short.password2 = "abc".into();
        assert!(clean_registration(&short).unwrap_err().has("password1"));
    }

    #[test]
    fn test_clean_login_requires_both_fields() {
        let errors = clean_login(&LoginFormData::default()).unwrap_err();
        assert!(errors.has("username"));
        assert!(errors.has("password"));
    }

    #[test]
    fn test_slug_charset_and_length() {
        assert!(is_valid_slug("travel-2024_eu"));
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("with space"));
        assert!(!is_valid_slug("путешествия"));
        assert!(!is_valid_slug(&"a".repeat(SLUG_MAX_LEN + 1)));
    }
}
