pub mod access;
pub mod cart;
pub mod checkout;
pub mod inventory;
pub mod pricing;
pub mod rating;
pub mod stock;

use sea_orm::{sea_query::SimpleExpr, ColumnTrait};

/// Matches an optional size foreign key, treating `None` as `IS NULL`.
pub fn size_condition<C: ColumnTrait>(column: C, size_id: Option<i32>) -> SimpleExpr {
    match size_id {
        Some(id) => column.eq(id),
        None => column.is_null(),
    }
}

/// Blank or whitespace-only size names count as no size.
pub fn normalize_size(size_name: Option<&str>) -> Option<String> {
    size_name
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_sizes_are_absent() {
        assert_eq!(normalize_size(Some("  ")), None);
        assert_eq!(normalize_size(None), None);
        assert_eq!(normalize_size(Some(" XL ")), Some("XL".to_owned()));
    }
}
