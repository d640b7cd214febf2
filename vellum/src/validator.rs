/// Keywords a migration statement must contain to be submitted upward.
pub const PERMITTED_KEYWORDS: [&str; 5] = ["CREATE", "INSERT", "UPDATE", "DELETE", "DROP"];

/// Case-sensitive substring check, not a parser: `"CREATE TABLE X"` passes,
/// `"SELECT * FROM X"` and `"create table x"` do not.
pub fn is_permitted(statement: &str) -> bool {
    PERMITTED_KEYWORDS
        .iter()
        .any(|keyword| statement.contains(keyword))
}
