use crate::auth::password;
use serde::Deserialize;

/// A rejected form field; renders as `Error in field "<field>": <reason>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub reason: String,
}

impl FieldError {
    fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Error in field \"{}\": {}", self.field, self.reason)
    }
}

const REQUIRED: &str = "This field is required.";

fn required(errors: &mut Vec<FieldError>, field: &'static str, value: &str) -> bool {
    if value.trim().is_empty() {
        errors.push(FieldError::new(field, REQUIRED));
        false
    } else {
        true
    }
}

fn max_len(errors: &mut Vec<FieldError>, field: &'static str, value: &str, max: usize) {
    let len = value.trim().chars().count();
    if len > max {
        errors.push(FieldError::new(
            field,
            format!("Ensure this value has at most {} characters (it has {}).", max, len),
        ));
    }
}

/// Loose structural email check: one `@`, a non-empty local part and a dotted domain
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.len() > 254 || email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..")
}

fn email_field(errors: &mut Vec<FieldError>, field: &'static str, value: &str) {
    if required(errors, field, value) && !is_valid_email(value) {
        errors.push(FieldError::new(field, "Enter a valid email address."));
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub contact_name: String,
    #[serde(default)]
    pub contact_email: String,
    #[serde(default)]
    pub message: String,
}

impl ContactForm {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        if required(&mut errors, "name", &self.contact_name) {
            max_len(&mut errors, "name", &self.contact_name, 100);
        }
        email_field(&mut errors, "email", &self.contact_email);
        required(&mut errors, "message", &self.message);
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrationForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
    #[serde(default)]
    pub phone: String,
}

fn is_valid_username(username: &str) -> bool {
    username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
}

impl RegistrationForm {
    /// Field rules that need no database access; username uniqueness is checked by the handler
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        if required(&mut errors, "username", &self.username) {
            max_len(&mut errors, "username", &self.username, 150);
            if !is_valid_username(self.username.trim()) {
                errors.push(FieldError::new(
                    "username",
                    "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
                ));
            }
        }
        if required(&mut errors, "first_name", &self.first_name) {
            max_len(&mut errors, "first_name", &self.first_name, 30);
        }
        if required(&mut errors, "last_name", &self.last_name) {
            max_len(&mut errors, "last_name", &self.last_name, 30);
        }
        email_field(&mut errors, "email", &self.email);
        max_len(&mut errors, "phone", &self.phone, 20);

        let has_first = required(&mut errors, "password1", &self.password1);
        let has_second = required(&mut errors, "password2", &self.password2);
        if has_first && has_second {
            if self.password1 != self.password2 {
                errors.push(FieldError::new("password2", "The two password fields didn't match."));
            } else if let Err(reason) = password::check_strength(&self.password1, self.username.trim()) {
                errors.push(FieldError::new("password2", reason));
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileForm {
    pub phone: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration() -> RegistrationForm {
        RegistrationForm {
            username: "ivan.petrov".to_string(),
            first_name: "Ivan".to_string(),
            last_name: "Petrov".to_string(),
            email: "ivan@example.com".to_string(),
            password1: "tea-and-sofas".to_string(),
            password2: "tea-and-sofas".to_string(),
            phone: "+79990001122".to_string(),
        }
    }

    #[test]
    fn test_is_valid_email() {
        assert!(is_valid_email("guest@example.com"));
        assert!(is_valid_email("first.last+tag@mail.example.ru"));
        assert!(!is_valid_email("guest@localhost"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("guest@@example.com"));
        assert!(!is_valid_email("guest example@example.com"));
        assert!(!is_valid_email("guest@example..com"));
    }

    #[test]
    fn test_contact_form() {
        let form = ContactForm {
            contact_name: "Maria".to_string(),
            contact_email: "maria@example.com".to_string(),
            message: "Do you have a projector?".to_string(),
        };
        assert!(form.validate().is_ok());

        let errors = ContactForm::default().validate().unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["name", "email", "message"]);
        assert_eq!(errors[0].to_string(), "Error in field \"name\": This field is required.");

        let form = ContactForm {
            contact_name: "M".repeat(101),
            contact_email: "not-an-email".to_string(),
            message: "Hi".to_string(),
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_registration_ok() {
        assert!(registration().validate().is_ok());

        let mut form = registration();
        form.phone = String::new();
        assert!(form.validate().is_ok());
    }

    #[test]
    fn test_registration_password_rules() {
        let mut form = registration();
        form.password2 = "something-else".to_string();
        let errors = form.validate().unwrap_err();
        assert_eq!(errors[0].reason, "The two password fields didn't match.");

        let mut form = registration();
        form.password1 = "12345678".to_string();
        form.password2 = "12345678".to_string();
        let errors = form.validate().unwrap_err();
        assert_eq!(errors[0].field, "password2");
    }

    #[test]
    fn test_registration_username_rules() {
        let mut form = registration();
        form.username = "ivan petrov".to_string();
        assert!(form.validate().is_err());

        let mut form = registration();
        form.username = "u".repeat(151);
        assert!(form.validate().is_err());

        let mut form = registration();
        form.first_name = "N".repeat(31);
        let errors = form.validate().unwrap_err();
        assert_eq!(errors[0].field, "first_name");
    }
}
