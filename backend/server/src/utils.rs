use std::{collections::HashSet, hash::Hash, iter::repeat_with, sync::LazyLock};

use regex::Regex;

use crate::{error::AppError, payloads::IngredientAmount};

pub const MIN_AMOUNT: i32 = 1;
pub const MIN_COOKING_TIME: i32 = 1;

pub const LIMIT_EMAIL: usize = 254;
pub const LIMIT_USERNAME: usize = 150;
pub const LIMIT_NAME: usize = 150;
pub const LIMIT_PASSWORD: usize = 150;
pub const LIMIT_RECIPE_NAME: usize = 256;

static USERNAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.@+-]+$").expect("username pattern"));
static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern"));

/// Random string over `[A-Za-z0-9]`.
pub fn random_alphanumeric(length: usize) -> String {
    repeat_with(fastrand::alphanumeric).take(length).collect()
}

pub fn validate_required(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::malformed(format!("{field} may not be blank")));
    }

    Ok(())
}

pub fn validate_text(field: &str, value: &str, limit: usize) -> Result<(), AppError> {
    validate_required(field, value)?;

    if value.chars().count() > limit {
        return Err(AppError::malformed(format!(
            "{field} is longer than {limit} characters"
        )));
    }

    Ok(())
}

pub fn validate_username(username: &str) -> Result<(), AppError> {
    validate_text("username", username, LIMIT_USERNAME)?;

    if !USERNAME.is_match(username) {
        return Err(AppError::malformed(
            "username may only contain letters, digits and @/./+/-/_",
        ));
    }

    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), AppError> {
    validate_text("email", email, LIMIT_EMAIL)?;

    if !EMAIL.is_match(email) {
        return Err(AppError::malformed("email is not a valid address"));
    }

    Ok(())
}

pub fn validate_cooking_time(cooking_time: i32) -> Result<(), AppError> {
    if cooking_time < MIN_COOKING_TIME {
        return Err(AppError::malformed(format!(
            "cooking_time must be at least {MIN_COOKING_TIME}"
        )));
    }

    Ok(())
}

pub fn validate_amount(amount: i32) -> Result<(), AppError> {
    if amount < MIN_AMOUNT {
        return Err(AppError::malformed(format!(
            "amount must be at least {MIN_AMOUNT}"
        )));
    }

    Ok(())
}

/// Checks the ingredient and tag lists of a recipe payload.
pub fn validate_recipe_lines(
    ingredients: &[IngredientAmount],
    tags: &[i32],
) -> Result<(), AppError> {
    if ingredients.is_empty() {
        return Err(AppError::malformed("ingredients may not be empty"));
    }

    if tags.is_empty() {
        return Err(AppError::malformed("tags may not be empty"));
    }

    if has_duplicates(ingredients.iter().map(|line| line.id)) {
        return Err(AppError::malformed("ingredients must not repeat"));
    }

    if has_duplicates(tags.iter().copied()) {
        return Err(AppError::malformed("tags must not repeat"));
    }

    ingredients
        .iter()
        .try_for_each(|line| validate_amount(line.amount))
}

fn has_duplicates<T: Eq + Hash>(items: impl IntoIterator<Item = T>) -> bool {
    let mut seen = HashSet::new();

    items.into_iter().any(|item| !seen.insert(item))
}

/// Boolean query flag as sent by the frontend.
pub fn parse_flag(value: &str) -> Option<bool> {
    match value {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}

pub const LIKE_ESCAPE: char = '|';

/// Lowercased `LIKE` pattern matching names that start with `prefix`.
///
/// Wildcards in the input are escaped with [`LIKE_ESCAPE`] so they match literally.
pub fn like_prefix(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);

    for c in prefix.to_lowercase().chars() {
        if matches!(c, '%' | '_') || c == LIKE_ESCAPE {
            pattern.push(LIKE_ESCAPE);
        }
        pattern.push(c);
    }
    pattern.push('%');

    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(id: i32, amount: i32) -> IngredientAmount {
        IngredientAmount { id, amount }
    }

    #[test]
    fn test_random_alphanumeric() {
        let token = random_alphanumeric(32);

        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(random_alphanumeric(0), "");
    }

    #[test]
    fn test_username() {
        assert!(validate_username("chef.john+1@home").is_ok());
        assert!(validate_username("bad name").is_err());
        assert!(validate_username("semi;colon").is_err());
        assert!(validate_username("").is_err());
        assert!(validate_username(&"a".repeat(LIMIT_USERNAME + 1)).is_err());
    }

    #[test]
    fn test_email() {
        assert!(validate_email("cook@example.com").is_ok());
        assert!(validate_email("cook@example").is_err());
        assert!(validate_email("cook example.com").is_err());
    }

    #[test]
    fn test_amount_rejects_zero_and_negative() {
        assert!(validate_amount(1).is_ok());
        assert!(validate_amount(0).is_err());
        assert!(validate_amount(-5).is_err());
    }

    #[test]
    fn test_recipe_lines() {
        assert!(validate_recipe_lines(&[line(1, 100), line(2, 1)], &[1, 2]).is_ok());

        assert!(validate_recipe_lines(&[], &[1]).is_err());
        assert!(validate_recipe_lines(&[line(1, 1)], &[]).is_err());
        assert!(validate_recipe_lines(&[line(1, 1), line(1, 2)], &[1]).is_err());
        assert!(validate_recipe_lines(&[line(1, 1)], &[3, 3]).is_err());
        assert!(validate_recipe_lines(&[line(1, 0)], &[1]).is_err());
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("1"), Some(true));
        assert_eq!(parse_flag("true"), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("false"), Some(false));
        assert_eq!(parse_flag("yes"), None);
    }

    #[test]
    fn test_like_prefix() {
        assert_eq!(like_prefix("Fl"), "fl%");
        assert_eq!(like_prefix("100%"), "100|%%");
        assert_eq!(like_prefix("_a|b"), "|_a||b%");
        assert_eq!(like_prefix(""), "%");
    }
}
