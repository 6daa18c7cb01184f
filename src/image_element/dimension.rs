//! # 尺寸换算模块
//!
//! `width` / `height` 属性接受“任何能转换成数字的值”，并按 DOM 属性反射的历史规则存储：
//! 非数字、负数、超过 2³¹−1 的值都存为 0（溢出保护而不是截到最大值），
//! 其余向零截断后存为 `u32`。换算永远不会失败。

/// 2³¹−1，DOM 属性反射允许的最大值。
pub const MAX_DIMENSION: u32 = 0x7fff_ffff;

/// 能按 JavaScript `Number()` 规则转换为数字的值。
pub trait DimensionValue {
    fn to_number(&self) -> f64;
}

macro_rules! impl_dimension_value_for_numbers {
    ($($ty:ty),*) => {
        $(
            impl DimensionValue for $ty {
                fn to_number(&self) -> f64 {
                    *self as f64
                }
            }
        )*
    };
}

impl_dimension_value_for_numbers!(f64, f32, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl DimensionValue for bool {
    fn to_number(&self) -> f64 {
        if *self { 1.0 } else { 0.0 }
    }
}

impl DimensionValue for str {
    fn to_number(&self) -> f64 {
        string_to_number(self)
    }
}

impl DimensionValue for String {
    fn to_number(&self) -> f64 {
        string_to_number(self)
    }
}

impl<T: DimensionValue + ?Sized> DimensionValue for &T {
    fn to_number(&self) -> f64 {
        (**self).to_number()
    }
}

/// 换算为存储值。
///
/// # 示例
/// ```rust
/// use headless_image::image_element::coerce_dimension;
///
/// assert_eq!(coerce_dimension("4"), 4);
/// assert_eq!(coerce_dimension(4.5), 4);
/// assert_eq!(coerce_dimension(f64::NAN), 0);
/// assert_eq!(coerce_dimension(-4), 0);
/// assert_eq!(coerce_dimension(2_147_483_648_u64), 0);
/// ```
pub fn coerce_dimension(value: impl DimensionValue) -> u32 {
    let number = value.to_number();

    if number.is_nan() || number < 0.0 || number > f64::from(MAX_DIMENSION) {
        return 0;
    }

    number.trunc() as u32
}

/// JavaScript 的字符串转数字规则（StringToNumber）。
fn string_to_number(text: &str) -> f64 {
    let trimmed = text.trim_matches(is_js_whitespace);
    if trimmed.is_empty() {
        return 0.0;
    }

    let radix = match trimmed.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0o" | "0O") => Some(8),
        Some("0b" | "0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        return parse_radix_integer(&trimmed[2..], radix);
    }

    let unsigned = trimmed.strip_prefix(['+', '-']).unwrap_or(trimmed);
    if unsigned == "Infinity" {
        return if trimmed.starts_with('-') { f64::NEG_INFINITY } else { f64::INFINITY };
    }

    // Rust 的 f64 解析还接受 "inf" / "nan" 等写法，JavaScript 不接受。
    let is_decimal_literal = !unsigned.is_empty()
        && unsigned
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
        && unsigned.chars().next().is_some_and(|c| c.is_ascii_digit() || c == '.');

    if !is_decimal_literal {
        return f64::NAN;
    }

    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

/// JavaScript 的 WhiteSpace 与 LineTerminator。
///
/// 比 `char::is_whitespace` 窄：U+0085（NEL）等字符不在其中。
fn is_js_whitespace(c: char) -> bool {
    matches!(
        c,
        '\t' | '\u{0b}' | '\u{0c}' | ' ' | '\u{a0}' | '\u{feff}'
            | '\n' | '\r' | '\u{2028}' | '\u{2029}'
            | '\u{1680}' | '\u{2000}'..='\u{200a}' | '\u{202f}' | '\u{205f}' | '\u{3000}'
    )
}

fn parse_radix_integer(digits: &str, radix: u32) -> f64 {
    if digits.is_empty() {
        return f64::NAN;
    }

    let mut value = 0.0_f64;
    for c in digits.chars() {
        let Some(digit) = c.to_digit(radix) else {
            return f64::NAN;
        };
        value = value * f64::from(radix) + f64::from(digit);
    }
    value
}
