//! Public pages: home, shop, blog and the probes.

use reqwest::StatusCode;

use eletromcz_core::{Price, Slug};
use eletromcz_integration_tests::TestContext;
use eletromcz_site::models::{BlogPostFields, ProductFields};

fn product(name: &str, price: &str, active: bool) -> ProductFields {
    ProductFields {
        name: name.to_string(),
        description: format!("{name} para instalações residenciais"),
        price: Price::parse(price).unwrap(),
        old_price: None,
        image: None,
        active,
    }
}

fn post(n: usize, published: bool) -> BlogPostFields {
    BlogPostFields {
        title: format!("Post número {n}"),
        slug: Slug::parse(&format!("post-{n}")).unwrap(),
        content: "Primeiro parágrafo.\n\nSegundo parágrafo.".to_string(),
        summary: Some(format!("Resumo {n}")),
        image: None,
        published,
    }
}

#[tokio::test]
async fn test_health_probes() {
    let ctx = TestContext::new().await;

    assert_eq!(ctx.get_text("/health").await, "ok");
    let ready = ctx.client.get(ctx.url("/health/ready")).send().await.unwrap();
    assert_eq!(ready.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_home_page_with_security_headers() {
    let ctx = TestContext::new().await;

    let response = ctx.client.get(ctx.url("/")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let headers = response.headers().clone();
    assert_eq!(headers["x-frame-options"], "DENY");
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert!(headers.contains_key("content-security-policy"));
    assert!(headers.contains_key("x-request-id"));

    let body = response.text().await.unwrap();
    assert!(body.contains("Nossos Serviços"));
    assert!(body.contains("action=\"/enviar_contato\""));
}

#[tokio::test]
async fn test_shop_lists_only_active_products() {
    let ctx = TestContext::new().await;
    let products = ctx.state.products();
    products.create(&product("Disjuntor 32A", "199,90", true)).await.unwrap();
    products.create(&product("Tomada antiga", "5", false)).await.unwrap();

    let body = ctx.get_text("/loja").await;
    assert!(body.contains("Disjuntor 32A"));
    assert!(body.contains("R$ 199,90"));
    assert!(!body.contains("Tomada antiga"));
}

#[tokio::test]
async fn test_blog_pagination_clamps_and_defaults() {
    let ctx = TestContext::new().await;
    for n in 1..=7 {
        ctx.state
            .blog_posts()
            .create(&post(n, true), None)
            .await
            .unwrap();
    }
    ctx.state
        .blog_posts()
        .create(&post(99, false), None)
        .await
        .unwrap();

    let first = ctx.get_text("/blog").await;
    assert!(first.contains("Página 1 de 2"));
    assert!(first.contains("Post número 7"));
    assert!(!first.contains("Post número 99"));

    let second = ctx.get_text("/blog?page=2").await;
    assert!(second.contains("Post número 1<"));
    assert!(second.contains("Página 2 de 2"));

    assert!(ctx.get_text("/blog?page=abc").await.contains("Página 1 de 2"));
    assert!(ctx.get_text("/blog?page=50").await.contains("Página 2 de 2"));
}

#[tokio::test]
async fn test_blog_detail_hides_drafts() {
    let ctx = TestContext::new().await;
    ctx.state.blog_posts().create(&post(1, true), None).await.unwrap();
    ctx.state.blog_posts().create(&post(2, false), None).await.unwrap();

    let published = ctx.client.get(ctx.url("/blog/post-1")).send().await.unwrap();
    assert_eq!(published.status(), StatusCode::OK);
    assert!(published.text().await.unwrap().contains("<p>Segundo parágrafo.</p>"));

    let draft = ctx.client.get(ctx.url("/blog/post-2")).send().await.unwrap();
    assert_eq!(draft.status(), StatusCode::NOT_FOUND);

    let missing = ctx.client.get(ctx.url("/blog/nao-existe")).send().await.unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}
