//! Domain models for the milk distribution warehouse

/// Declares a snake_case string enum with `as_str`, `Display` and `FromStr`.
/// When a Postgres type name is given the enum also maps to that database
/// enum under the `sqlx` feature.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident $(as $pg:literal)? {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        $( #[cfg_attr(feature = "sqlx", derive(sqlx::Type), sqlx(type_name = $pg, rename_all = "snake_case"))] )?
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $text ),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $text => Ok($name::$variant), )+
                    other => Err(format!("unknown {}: {}", stringify!($name), other)),
                }
            }
        }
    };
}

mod back_order;
mod catalog;
mod goods_issue;
mod goods_receipt;
mod inventory;
mod location;
mod notification;
mod pallet;
mod purchase_order;
mod sales_order;
mod stocktaking;
mod user;

pub use back_order::*;
pub use catalog::*;
pub use goods_issue::*;
pub use goods_receipt::*;
pub use inventory::*;
pub use location::*;
pub use notification::*;
pub use pallet::*;
pub use purchase_order::*;
pub use sales_order::*;
pub use stocktaking::*;
pub use user::*;

/// Generate a document code, e.g. `PO-20261016-0007`
pub fn generate_document_code(prefix: &str, date: chrono::NaiveDate, sequence: i64) -> String {
    format!("{}-{}-{:04}", prefix, date.format("%Y%m%d"), sequence)
}

/// `PO-20261016-` style stem shared by every code issued on `date`
pub fn document_code_stem(prefix: &str, date: chrono::NaiveDate) -> String {
    format!("{}-{}-", prefix, date.format("%Y%m%d"))
}

/// Sequence number of `code` when it was issued under `prefix` on `date`
pub fn parse_document_sequence(code: &str, prefix: &str, date: chrono::NaiveDate) -> Option<i64> {
    let suffix = code.strip_prefix(document_code_stem(prefix, date).as_str())?;
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    suffix.parse().ok()
}

/// Next sequence after the highest one already issued.
///
/// Gaps left by deleted documents are never reused.
pub fn next_document_sequence<'a, I>(codes: I, prefix: &str, date: chrono::NaiveDate) -> i64
where
    I: IntoIterator<Item = &'a str>,
{
    codes
        .into_iter()
        .filter_map(|code| parse_document_sequence(code, prefix, date))
        .max()
        .unwrap_or(0)
        + 1
}
