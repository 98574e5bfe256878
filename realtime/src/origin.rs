/// Allow-list of browser origins permitted to open a realtime connection.
///
/// Matching is exact after trimming whitespace; there are no wildcards.
#[derive(Debug, Clone, Default)]
pub struct OriginPolicy {
    allowed: Vec<String>,
}

impl OriginPolicy {
    pub fn new<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed = origins
            .into_iter()
            .map(|origin| origin.as_ref().trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();
        Self { allowed }
    }

    /// A request with no `Origin` header is rejected.
    pub fn allows(&self, origin: Option<&str>) -> bool {
        match origin {
            Some(origin) => {
                let origin = origin.trim();
                self.allowed.iter().any(|allowed| allowed == origin)
            }
            None => false,
        }
    }

    pub fn origins(&self) -> &[String] {
        &self.allowed
    }
}
