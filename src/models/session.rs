/// An authenticated principal against the library upstream.
///
/// Holds the upstream access token for proxied calls; the token never leaves
/// the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub user_name: String,
    pub token: String,
}
