#[test]
fn html_root_url() {
	version_sync::assert_html_root_url_updated!("src/lib.rs");
}

#[test]
fn markdown_dependencies() {
	version_sync::assert_markdown_deps_updated!("README.md");
}
