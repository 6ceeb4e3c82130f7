//! Resolving the drawable surface the session renders into

use crate::error::InitError;

/// Either a concrete surface handle or a name to look one up by.
///
/// Resolved exactly once at startup; everything after that works with the
/// concrete handle.
#[derive(Clone, Debug, PartialEq)]
pub enum SurfaceSource<H> {
    Handle(H),
    LookupName(String),
}

impl<H> SurfaceSource<H> {
    pub fn resolve<F>(self, lookup: F) -> Result<H, InitError>
    where
        F: FnOnce(&str) -> Option<H>,
    {
        match self {
            SurfaceSource::Handle(handle) => Ok(handle),
            SurfaceSource::LookupName(name) => match lookup(&name) {
                Some(handle) => Ok(handle),
                None => Err(InitError::SurfaceNotFound(name)),
            },
        }
    }
}

impl<H> From<H> for SurfaceSource<H> {
    fn from(handle: H) -> Self {
        SurfaceSource::Handle(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_resolves_without_lookup() {
        let source = SurfaceSource::Handle(7u32);
        assert_eq!(source.resolve(|_| None).unwrap(), 7);
    }

    #[test]
    fn name_resolves_through_lookup() {
        let source: SurfaceSource<u32> = SurfaceSource::LookupName("main".into());
        let resolved = source.resolve(|name| (name == "main").then_some(3));
        assert_eq!(resolved.unwrap(), 3);
    }

    #[test]
    fn unknown_name_is_surface_not_found() {
        let source: SurfaceSource<u32> = SurfaceSource::LookupName("webgl-canvas".into());
        match source.resolve(|_| None) {
            Err(InitError::SurfaceNotFound(name)) => assert_eq!(name, "webgl-canvas"),
            other => panic!("unexpected {:?}", other),
        }
    }
}
