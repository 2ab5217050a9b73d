/// Short git SHA of the build, stamped by build.rs when the tree was a git checkout.
pub fn git_sha() -> Option<&'static str> {
    option_env!("ODEX_BUILD_GIT_SHA")
}

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
