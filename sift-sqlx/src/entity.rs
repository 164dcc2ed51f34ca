/// A row type the SQL driver can select and identity-key.
///
/// `columns` drives the generated select list; `id` supplies the identity
/// key under which [`SqlxResult`](crate::SqlxResult) indexes each record.
///
/// # Example
///
/// ```ignore
/// impl Entity for News {
///     type Id = i64;
///     fn table_name() -> &'static str { "news" }
///     fn columns() -> &'static [&'static str] { &["id", "title", "author"] }
///     fn id(&self) -> &i64 { &self.id }
/// }
/// ```
pub trait Entity: Send + Sync + Unpin + 'static {
    type Id: Send + Sync + ToString + 'static;

    fn table_name() -> &'static str;

    fn id_column() -> &'static str {
        "id"
    }

    fn columns() -> &'static [&'static str];

    fn id(&self) -> &Self::Id;

    /// Identity key used to index result records.
    fn identity(&self) -> String {
        self.id().to_string()
    }
}
