//! Validation utilities for warehouse documents
//!
//! Shape checks on inputs live on the DTOs (`validator::Validate`); the
//! functions here cover rules that need more than one field or a clock.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::OrderLineInput;

// ============================================================================
// Order lines
// ============================================================================

/// Validate order lines: at least one, positive quantities, no duplicate goods
pub fn validate_order_lines(lines: &[OrderLineInput]) -> Result<(), &'static str> {
    if lines.is_empty() {
        return Err("Đơn hàng phải có ít nhất một mặt hàng");
    }
    if lines.iter().any(|l| l.quantity <= 0) {
        return Err("Số lượng phải lớn hơn 0");
    }
    let mut seen: Vec<Uuid> = Vec::with_capacity(lines.len());
    for line in lines {
        if seen.contains(&line.goods_id) {
            return Err("Mỗi mặt hàng chỉ được xuất hiện một lần trong đơn");
        }
        seen.push(line.goods_id);
    }
    if lines
        .iter()
        .any(|l| l.unit_price.map(|p| p.is_sign_negative()).unwrap_or(false))
    {
        return Err("Đơn giá không được âm");
    }
    Ok(())
}

// ============================================================================
// Dates
// ============================================================================

/// Estimated arrival may be today but not in the past
pub fn validate_arrival_date(date: NaiveDate, today: NaiveDate) -> Result<(), &'static str> {
    if date < today {
        return Err("Ngày dự kiến hàng về không được ở trong quá khứ");
    }
    Ok(())
}

/// Expiry must come after manufacturing
pub fn validate_shelf_life(
    manufacturing: NaiveDate,
    expiry: NaiveDate,
) -> Result<(), &'static str> {
    if expiry <= manufacturing {
        return Err("Hạn sử dụng phải sau ngày sản xuất");
    }
    Ok(())
}

/// Requested delivery may be today but not in the past
pub fn validate_delivery_date(date: NaiveDate, today: NaiveDate) -> Result<(), &'static str> {
    if date < today {
        return Err("Ngày giao hàng không được ở trong quá khứ");
    }
    Ok(())
}

// ============================================================================
// Free text
// ============================================================================

/// Rejections must say why
pub fn validate_rejection_reason(reason: Option<&str>) -> Result<&str, &'static str> {
    match reason.map(str::trim) {
        Some(r) if !r.is_empty() => {
            if r.chars().count() > 500 {
                Err("Lý do từ chối tối đa 500 ký tự")
            } else {
                Ok(r)
            }
        }
        _ => Err("Vui lòng nhập lý do từ chối"),
    }
}

/// Validate username: 3-50 chars, lowercase letters, digits, dot or underscore
pub fn validate_username(username: &str) -> Result<(), &'static str> {
    if username.len() < 3 || username.len() > 50 {
        return Err("Tên đăng nhập phải có từ 3 đến 50 ký tự");
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '_')
    {
        return Err("Tên đăng nhập chỉ gồm chữ thường, số, dấu chấm hoặc gạch dưới");
    }
    Ok(())
}

/// Validate password strength
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.len() < 8 {
        return Err("Mật khẩu phải có ít nhất 8 ký tự");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn line(goods_id: Uuid, quantity: i32) -> OrderLineInput {
        OrderLineInput {
            goods_id,
            quantity,
            unit_price: Some(Decimal::from(12_000)),
        }
    }

    #[test]
    fn test_order_lines() {
        let g = Uuid::new_v4();
        assert!(validate_order_lines(&[line(g, 10)]).is_ok());
        assert!(validate_order_lines(&[]).is_err());
        assert!(validate_order_lines(&[line(g, 0)]).is_err());
        assert!(validate_order_lines(&[line(g, 1), line(g, 2)]).is_err());

        let mut negative = line(Uuid::new_v4(), 1);
        negative.unit_price = Some(Decimal::from(-1));
        assert!(validate_order_lines(&[negative]).is_err());
    }

    #[test]
    fn test_arrival_date() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        assert!(validate_arrival_date(today, today).is_ok());
        assert!(validate_arrival_date(today.succ_opt().unwrap(), today).is_ok());
        assert!(validate_arrival_date(today.pred_opt().unwrap(), today).is_err());
    }

    #[test]
    fn test_shelf_life() {
        let mfg = NaiveDate::from_ymd_opt(2026, 10, 1).unwrap();
        let exp = NaiveDate::from_ymd_opt(2026, 10, 10).unwrap();
        assert!(validate_shelf_life(mfg, exp).is_ok());
        assert!(validate_shelf_life(exp, mfg).is_err());
        assert!(validate_shelf_life(mfg, mfg).is_err());
    }

    #[test]
    fn test_rejection_reason() {
        assert_eq!(validate_rejection_reason(Some("  sai giá ")), Ok("sai giá"));
        assert!(validate_rejection_reason(Some("   ")).is_err());
        assert!(validate_rejection_reason(None).is_err());
    }

    #[test]
    fn test_username() {
        assert!(validate_username("thukho.a").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("Thu Kho").is_err());
    }
}
