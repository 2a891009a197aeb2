use std::sync::LazyLock;

use crate::build_info::BUILD_INFO;

/// Application version: image version, short commit and a dirty marker.
pub static VERSION: LazyLock<String> = LazyLock::new(|| {
    compose(
        env!("IMAGE_VERSION"),
        BUILD_INFO.commit_sha1,
        BUILD_INFO.git_dirty,
    )
});

fn compose(image_version: &str, commit: Option<&str>, dirty: bool) -> String {
    format!(
        "{image_version}-{}{}",
        commit.unwrap_or("unknown"),
        if dirty { "-dirty" } else { "" }
    )
}
