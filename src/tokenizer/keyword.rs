/// Reserved words of the expression language. They are recognized only as whole
/// identifiers, so `trueish` stays an identifier.
#[derive(
    Debug, Clone, PartialEq, strum::EnumString, strum::Display, strum::EnumIter, strum::AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum Keyword {
    True,
    False,
    Null,
}
