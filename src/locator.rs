//! Item-to-locator resolution

/// Maps an item to the locator (usually a URL) that is requested for it
///
/// Resolution is synchronous and must not fail for well-formed items. A
/// locator the transport cannot use surfaces later as a transport error.
///
/// Any `Fn(&I) -> String` closure is a resolver:
///
/// ```
/// use batch_fetch::locator::LocatorResolver;
///
/// let resolver = |id: &u32| format!("https://example.com/items/{id}");
/// assert_eq!(resolver.resolve(&7u32), "https://example.com/items/7");
/// ```
pub trait LocatorResolver<I>: Send + Sync {
    /// Produce the locator for `item`
    fn resolve(&self, item: &I) -> String;
}

/// Default resolver: the item already is its locator
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl<I> LocatorResolver<I> for Identity
where
    I: AsRef<str>,
{
    fn resolve(&self, item: &I) -> String {
        item.as_ref().to_string()
    }
}

impl<I, F> LocatorResolver<I> for F
where
    F: Fn(&I) -> String + Send + Sync,
{
    fn resolve(&self, item: &I) -> String {
        self(item)
    }
}

/// Resolver that joins each item onto a fixed base URL
///
/// ```
/// use batch_fetch::locator::{BaseUrl, LocatorResolver};
///
/// let resolver = BaseUrl::new("https://example.com/files/");
/// assert_eq!(resolver.resolve(&"a.txt"), "https://example.com/files/a.txt");
/// ```
#[derive(Debug, Clone)]
pub struct BaseUrl {
    base: String,
}

impl BaseUrl {
    /// Use `base` as the prefix; a trailing slash is added if missing
    pub fn new(base: impl Into<String>) -> Self {
        let mut base = base.into();
        if !base.ends_with('/') {
            base.push('/');
        }
        Self { base }
    }
}

impl<I> LocatorResolver<I> for BaseUrl
where
    I: AsRef<str>,
{
    fn resolve(&self, item: &I) -> String {
        format!("{}{}", self.base, item.as_ref().trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_returns_the_item() {
        assert_eq!(
            Identity.resolve(&"http://example.com/a".to_string()),
            "http://example.com/a"
        );
        assert_eq!(Identity.resolve(&"http://example.com/b"), "http://example.com/b");
    }

    #[test]
    fn closures_resolve_custom_items() {
        struct Page {
            number: u32,
        }
        let resolver = |page: &Page| format!("http://example.com/?page={}", page.number);

        assert_eq!(
            resolver.resolve(&Page { number: 3 }),
            "http://example.com/?page=3"
        );
    }

    #[test]
    fn base_url_joins_without_doubling_slashes() {
        let with_slash = BaseUrl::new("http://example.com/api/");
        let without_slash = BaseUrl::new("http://example.com/api");

        assert_eq!(with_slash.resolve(&"/users"), "http://example.com/api/users");
        assert_eq!(without_slash.resolve(&"users"), "http://example.com/api/users");
    }
}
