use once_cell::sync::Lazy;
use regex::Regex;

static SECTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9]{1,8}$").expect("Invalid section regex"));

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Z|a-z]{2,}$").expect("Invalid email regex")
});

pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if email.len() > 254 || !EMAIL_RE.is_match(email) {
        return Err("Email format is invalid");
    }
    Ok(())
}

pub fn validate_full_name(full_name: &str) -> Result<(), &'static str> {
    let trimmed = full_name.trim();
    if trimmed.is_empty() {
        return Err("Full name is required");
    }
    if trimmed.chars().count() > 100 {
        return Err("Full name must be at most 100 characters");
    }
    Ok(())
}

/// 班级编号与班号
pub fn validate_class_identity(class_number: i32, section: &str) -> Result<(), &'static str> {
    if class_number <= 0 {
        return Err("Class number must be a positive integer");
    }
    if !SECTION_RE.is_match(section) {
        return Err("Section must be 1-8 letters or digits");
    }
    Ok(())
}

/// 密码策略验证结果
#[derive(Debug, Clone)]
pub struct PasswordValidationResult {
    pub is_valid: bool,
    pub errors: Vec<&'static str>,
}

impl PasswordValidationResult {
    pub fn error_message(&self) -> String {
        self.errors.join("; ")
    }
}

/// 验证密码是否符合安全策略
///
/// 策略要求：
/// - 最小长度：8 字符
/// - 必须包含：大写字母 + 小写字母 + 数字
/// - 可选：特殊字符（增强安全性）
pub fn validate_password(password: &str) -> PasswordValidationResult {
    let mut errors = Vec::new();

    // 1. 长度检查：至少 8 个字符
    if password.len() < 8 {
        errors.push("Password must be at least 8 characters long");
    }

    // 2. 大写字母检查
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        errors.push("Password must contain at least one uppercase letter");
    }

    // 3. 小写字母检查
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        errors.push("Password must contain at least one lowercase letter");
    }

    // 4. 数字检查
    if !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push("Password must contain at least one digit");
    }

    // 5. 常见弱密码检查
    let weak_passwords = [
        "password",
        "12345678",
        "123456789",
        "qwerty123",
        "admin123",
        "password1",
        "Password1",
        "Qwerty123",
        "Abcd1234",
    ];
    if weak_passwords
        .iter()
        .any(|&weak| password.eq_ignore_ascii_case(weak))
    {
        errors.push("Password is too common, please choose a stronger password");
    }

    PasswordValidationResult {
        is_valid: errors.is_empty(),
        errors,
    }
}

/// 简化的密码验证（返回 Result）
pub fn validate_password_simple(password: &str) -> Result<(), String> {
    let result = validate_password(password);
    if result.is_valid {
        Ok(())
    } else {
        Err(result.error_message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email() {
        assert!(validate_email("teacher@school.edu").is_ok());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("a@b").is_err());
    }

    #[test]
    fn test_full_name() {
        assert!(validate_full_name("Ana Lima").is_ok());
        assert!(validate_full_name("   ").is_err());
        assert!(validate_full_name(&"x".repeat(101)).is_err());
    }

    #[test]
    fn test_class_identity() {
        assert!(validate_class_identity(5, "A").is_ok());
        assert!(validate_class_identity(0, "A").is_err());
        assert!(validate_class_identity(5, "").is_err());
        assert!(validate_class_identity(5, "A-1").is_err());
    }

    #[test]
    fn test_valid_password() {
        assert!(validate_password("SecureP@ss1").is_valid);
        assert!(validate_password("MyP@ssw0rd").is_valid);
        assert!(validate_password("SecurePass123").is_valid);
    }

    #[test]
    fn test_short_password() {
        let result = validate_password("Ab1");
        assert!(!result.is_valid);
        assert!(
            result
                .errors
                .contains(&"Password must be at least 8 characters long")
        );
    }

    #[test]
    fn test_no_uppercase() {
        let result = validate_password("abcd1234");
        assert!(!result.is_valid);
        assert!(
            result
                .errors
                .contains(&"Password must contain at least one uppercase letter")
        );
    }

    #[test]
    fn test_no_lowercase() {
        let result = validate_password("ABCD1234");
        assert!(!result.is_valid);
        assert!(
            result
                .errors
                .contains(&"Password must contain at least one lowercase letter")
        );
    }

    #[test]
    fn test_no_digit() {
        let result = validate_password("AbcdEfgh");
        assert!(!result.is_valid);
        assert!(
            result
                .errors
                .contains(&"Password must contain at least one digit")
        );
    }

    #[test]
    fn test_common_password() {
        let result = validate_password("Password1");
        assert!(!result.is_valid);
        assert!(
            result
                .errors
                .contains(&"Password is too common, please choose a stronger password")
        );
    }
}
