//! Integration tests for registry probing order and link extraction.

use depcite_core::{CitableLink, DependencyName};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod support;
use support::fixtures::prober;
use support::socket_guard::start_mock_server_or_skip;

async fn mount_page(server: &MockServer, page_path: &str, status: u16, body: &str, hits: u64) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .expect(hits)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_pypi_hit_short_circuits_later_registries() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    let pypi_body = json!({
        "info": {
            "name": "snakemake",
            "project_urls": {"Source": "https://github.com/snakemake/snakemake"}
        }
    })
    .to_string();
    mount_page(&mock_server, "/pypi/snakemake/json", 200, &pypi_body, 1).await;
    mount_page(&mock_server, "/bioconda/snakemake/README.html", 200, "", 0).await;
    mount_page(&mock_server, "/conda-forge/snakemake", 200, "", 0).await;

    let link = prober(&mock_server)
        .search_repositories(&DependencyName::new("snakemake"))
        .await;
    assert_eq!(
        link,
        Some(CitableLink::Repo(
            "https://github.com/snakemake/snakemake".to_string()
        ))
    );
}

#[tokio::test]
async fn test_doi_preferred_over_repo_on_same_page() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    let page = r#"<a href="https://github.com/samtools/samtools">code</a>
        <p>Cite: https://doi.org/10.1093/bioinformatics/btp352</p>"#;
    mount_page(&mock_server, "/pypi/samtools/json", 404, "", 1).await;
    mount_page(&mock_server, "/bioconda/samtools/README.html", 200, page, 1).await;
    mount_page(&mock_server, "/conda-forge/samtools", 200, "", 0).await;

    let link = prober(&mock_server)
        .search_repositories(&DependencyName::new("samtools"))
        .await;
    assert_eq!(
        link,
        Some(CitableLink::Doi(
            "https://doi.org/10.1093/bioinformatics/btp352".to_string()
        ))
    );
}

#[tokio::test]
async fn test_failed_and_linkless_registries_are_skipped() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    let pypi_body = json!({"info": {"name": "bwa", "home_page": "http://bio-bwa.sf.net"}}).to_string();
    mount_page(&mock_server, "/pypi/bwa/json", 200, &pypi_body, 1).await;
    mount_page(&mock_server, "/bioconda/bwa/README.html", 500, "oops", 1).await;
    mount_page(
        &mock_server,
        "/conda-forge/bwa",
        200,
        "<html>dev_url https://github.com/lh3/bwa</html>",
        1,
    )
    .await;

    let link = prober(&mock_server)
        .search_repositories(&DependencyName::new("bwa"))
        .await;
    assert_eq!(
        link,
        Some(CitableLink::Repo("https://github.com/lh3/bwa".to_string()))
    );
}

#[tokio::test]
async fn test_no_registry_match_is_none() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_page(&mock_server, "/pypi/left-pad/json", 404, "", 1).await;
    mount_page(&mock_server, "/bioconda/left-pad/README.html", 404, "", 1).await;
    mount_page(
        &mock_server,
        "/conda-forge/left-pad",
        200,
        "<html>https://gitlab.com/someone/left-pad</html>",
        1,
    )
    .await;

    let link = prober(&mock_server)
        .search_repositories(&DependencyName::new("left-pad"))
        .await;
    assert!(link.is_none());
}

#[tokio::test]
async fn test_unreachable_registries_are_none() {
    let port = {
        let Ok(listener) = std::net::TcpListener::bind("127.0.0.1:0") else {
            return;
        };
        listener.local_addr().unwrap().port()
    };
    let prober = depcite_core::RegistryProber::with_endpoints(
        support::fixtures::http_client(),
        depcite_core::ProbeEndpoints::under(&format!("http://127.0.0.1:{port}")),
    );

    assert!(
        prober
            .search_repositories(&DependencyName::new("numpy"))
            .await
            .is_none()
    );
}
