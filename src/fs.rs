//! Static directory serving behind [`Routes::static_files`](crate::Routes::static_files).

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use http::StatusCode;
use percent_encoding::percent_decode_str;
use tracing::warn;

use crate::handler::{BoxFuture, ErasedHandler};
use crate::request::Request;
use crate::response::{ContentType, Response};

const INDEX: &str = "index.html";

/// Serves files from `root` for request paths under `mount`.
pub(crate) struct StaticDir {
    root: Arc<Path>,
    mount: Arc<str>,
}

impl StaticDir {
    /// `pattern` is the full registered pattern; its literal head (everything
    /// before the first dynamic segment) is what gets stripped per request.
    pub(crate) fn new(pattern: &str, root: PathBuf) -> Self {
        let mount = pattern
            .split('/')
            .take_while(|seg| !seg.starts_with('{') && !seg.starts_with(':'))
            .collect::<Vec<_>>()
            .join("/");
        Self { root: Arc::from(root), mount: Arc::from(mount) }
    }
}

impl ErasedHandler for StaticDir {
    fn call(&self, req: Request) -> BoxFuture {
        let root = Arc::clone(&self.root);
        let mount = Arc::clone(&self.mount);
        Box::pin(async move {
            let rest = req.path().strip_prefix(&*mount).unwrap_or(req.path());
            serve(&root, rest).await
        })
    }
}

async fn serve(root: &Path, rest: &str) -> Response {
    let Some(mut file) = resolve_under(root, rest) else {
        return Response::status(StatusCode::NOT_FOUND);
    };
    if tokio::fs::metadata(&file).await.is_ok_and(|m| m.is_dir()) {
        file.push(INDEX);
    }

    match tokio::fs::read(&file).await {
        Ok(bytes) => {
            let content_type = file.extension()
                .and_then(|e| e.to_str())
                .map_or(ContentType::OctetStream, ContentType::from_extension);
            Response::builder().bytes(content_type, bytes)
        }
        Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::PermissionDenied) => {
            Response::status(StatusCode::NOT_FOUND)
        }
        Err(e) => {
            warn!(file = %file.display(), "static file read failed: {e}");
            Response::status(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Joins the decoded request remainder onto `root`. `None` for anything
/// that could climb out of it.
fn resolve_under(root: &Path, rest: &str) -> Option<PathBuf> {
    let decoded = percent_decode_str(rest).decode_utf8().ok()?;
    let mut path = root.to_path_buf();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => return None,
            s if s.contains('\\') || s.contains('\0') => return None,
            s => path.push(s),
        }
    }
    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mount_is_the_literal_head() {
        assert_eq!(&*StaticDir::new("/ui/assets/{file:.+}", PathBuf::new()).mount, "/ui/assets");
        assert_eq!(&*StaticDir::new("/static/:file", PathBuf::new()).mount, "/static");
    }

    #[test]
    fn traversal_is_refused() {
        let root = Path::new("/srv/www");
        assert_eq!(resolve_under(root, "/css/site.css"), Some(PathBuf::from("/srv/www/css/site.css")));
        assert_eq!(resolve_under(root, "/../etc/passwd"), None);
        assert_eq!(resolve_under(root, "/%2e%2e/etc/passwd"), None);
        assert_eq!(resolve_under(root, "/a/./b"), Some(PathBuf::from("/srv/www/a/b")));
    }
}
