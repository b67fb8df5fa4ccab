use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds to cents, halves away from zero, always two decimal places.
pub fn round_money(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

/// Price after a percent discount.
pub fn final_price(price: Decimal, discount: Decimal) -> Decimal {
    if discount.is_zero() {
        return round_money(price);
    }
    round_money(price * (Decimal::ONE - discount / Decimal::ONE_HUNDRED))
}

pub fn line_total(unit_price: Decimal, quantity: i32) -> Decimal {
    round_money(unit_price * Decimal::from(quantity))
}

/// Mean of review ratings to one decimal place, zero without reviews.
pub fn average_rating(ratings: &[i32]) -> Decimal {
    if ratings.is_empty() {
        return Decimal::ZERO;
    }
    let sum: i64 = ratings.iter().map(|r| i64::from(*r)).sum();
    let mut average = (Decimal::from(sum) / Decimal::from(ratings.len() as i64))
        .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);
    average.rescale(1);
    average
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(value: &str) -> Decimal {
        Decimal::from_str(value).unwrap()
    }

    #[test]
    fn discount_is_applied_and_rounded_half_up() {
        assert_eq!(final_price(dec("100.00"), dec("15.00")), dec("85.00"));
        // 19.99 * 0.875 = 17.49125
        assert_eq!(final_price(dec("19.99"), dec("12.5")), dec("17.49"));
        // 0.05 * 0.5 = 0.025
        assert_eq!(final_price(dec("0.05"), dec("50")), dec("0.03"));
    }

    #[test]
    fn no_discount_keeps_price() {
        assert_eq!(final_price(dec("42"), Decimal::ZERO).to_string(), "42.00");
    }

    #[test]
    fn line_total_multiplies_quantity() {
        assert_eq!(line_total(dec("17.49"), 3), dec("52.47"));
    }

    #[test]
    fn average_rating_has_one_decimal() {
        assert_eq!(average_rating(&[5, 4, 4]).to_string(), "4.3");
        assert_eq!(average_rating(&[5, 4]).to_string(), "4.5");
        assert_eq!(average_rating(&[]), Decimal::ZERO);
    }
}
