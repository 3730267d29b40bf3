/// Format an amount as New Taiwan dollars with thousands separators and no
/// decimal places (zh-TW currency style): NT$1,234
pub fn money(val: f64) -> String {
    let negative = val < 0.0;
    let int_part = format!("{:.0}", val.abs());

    let mut with_commas = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    let with_commas: String = with_commas.chars().rev().collect();

    if negative {
        format!("-NT${with_commas}")
    } else {
        format!("NT${with_commas}")
    }
}

/// Compact form for chart axes: NT$15k, NT$1.5M.
pub fn money_compact(val: f64) -> String {
    if val >= 1_000_000.0 {
        let m = val / 1_000_000.0;
        if m == m.floor() {
            format!("NT${}M", m as u64)
        } else {
            format!("NT${:.1}M", m)
        }
    } else if val >= 1000.0 {
        let k = val / 1000.0;
        if k == k.floor() {
            format!("NT${}k", k as u64)
        } else {
            format!("NT${:.1}k", k)
        }
    } else {
        format!("NT${}", val as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_formatting() {
        assert_eq!(money(1234.0), "NT$1,234");
        assert_eq!(money(0.0), "NT$0");
        assert_eq!(money(145120.0), "NT$145,120");
        assert_eq!(money(-500.0), "-NT$500");
        assert_eq!(money(1000000.0), "NT$1,000,000");
    }

    #[test]
    fn test_money_rounds_to_whole_dollars() {
        assert_eq!(money(42.6), "NT$43");
        assert_eq!(money(42.4), "NT$42");
    }

    #[test]
    fn test_money_compact() {
        assert_eq!(money_compact(500.0), "NT$500");
        assert_eq!(money_compact(15000.0), "NT$15k");
        assert_eq!(money_compact(2500.0), "NT$2.5k");
        assert_eq!(money_compact(1500000.0), "NT$1.5M");
    }
}
