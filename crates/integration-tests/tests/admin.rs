//! Admin panel: guards, login, product and blog management.

use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};

use eletromcz_core::Price;
use eletromcz_integration_tests::{ADMIN_PASSWORD, TestContext, location};
use eletromcz_site::models::NewUser;
use eletromcz_site::services::auth::hash_password;

fn product_form(name: &str, price: &str) -> Form {
    Form::new()
        .text("name", name.to_string())
        .text("description", "Disjuntor bipolar curva C")
        .text("price", price.to_string())
        .text("old_price", "")
        .text("active", "y")
}

fn post_form(title: &str, slug: &str) -> Form {
    Form::new()
        .text("title", title.to_string())
        .text("slug", slug.to_string())
        .text("summary", "Resumo")
        .text("content", "Conteúdo do post.")
        .text("published", "y")
}

fn jpeg(name: &str) -> Part {
    Part::bytes(vec![0xFF, 0xD8, 0xFF, 0xE0])
        .file_name(name.to_string())
        .mime_str("image/jpeg")
        .unwrap()
}

#[tokio::test]
async fn test_admin_requires_login() {
    let ctx = TestContext::new().await;

    let response = ctx.client.get(ctx.url("/admin/products")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/admin/login?next=%2Fadmin%2Fproducts");

    let login = ctx.get_text("/admin/login?next=%2Fadmin%2Fproducts").await;
    assert!(login.contains("Por favor, faça login para acessar esta página."));
    assert!(login.contains("value=\"/admin/products\""));
}

#[tokio::test]
async fn test_login_rejects_wrong_password() {
    let ctx = TestContext::new().await;
    eletromcz_site::services::auth::create_admin(ctx.state.users(), "admin", ADMIN_PASSWORD)
        .await
        .unwrap();

    let response = ctx
        .client
        .post(ctx.url("/admin/login"))
        .form(&[("username", "admin"), ("password", "errada-123")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.text().await.unwrap().contains("Usuário ou senha inválidos."));

    let guarded = ctx.client.get(ctx.url("/admin")).send().await.unwrap();
    assert_eq!(guarded.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_login_follows_next_then_logout() {
    let ctx = TestContext::new().await;
    eletromcz_site::services::auth::create_admin(ctx.state.users(), "admin", ADMIN_PASSWORD)
        .await
        .unwrap();

    let response = ctx
        .client
        .post(ctx.url("/admin/login"))
        .form(&[
            ("username", "admin"),
            ("password", ADMIN_PASSWORD),
            ("next", "/admin/blog"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(location(&response), "/admin/blog");

    let dashboard = ctx.get_text("/admin").await;
    assert!(dashboard.contains("Olá, admin!"));

    let logout = ctx.client.get(ctx.url("/admin/logout")).send().await.unwrap();
    assert_eq!(location(&logout), "/admin/login");

    let after = ctx.client.get(ctx.url("/admin")).send().await.unwrap();
    assert_eq!(after.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_login_ignores_offsite_next() {
    let ctx = TestContext::new().await;
    eletromcz_site::services::auth::create_admin(ctx.state.users(), "admin", ADMIN_PASSWORD)
        .await
        .unwrap();

    let response = ctx
        .client
        .post(ctx.url("/admin/login"))
        .form(&[
            ("username", "admin"),
            ("password", ADMIN_PASSWORD),
            ("next", "https://evil.example/admin"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(location(&response), "/admin");
}

#[tokio::test]
async fn test_non_admin_user_is_turned_away() {
    let ctx = TestContext::new().await;
    ctx.state
        .users()
        .create(NewUser {
            username: "visitante".to_string(),
            password_hash: hash_password(ADMIN_PASSWORD).unwrap(),
            is_admin: false,
        })
        .await
        .unwrap();

    ctx.client
        .post(ctx.url("/admin/login"))
        .form(&[("username", "visitante"), ("password", ADMIN_PASSWORD)])
        .send()
        .await
        .unwrap();

    let response = ctx.client.get(ctx.url("/admin")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let login = ctx.get_text(location(&response)).await;
    assert!(login.contains("Acesso restrito a administradores."));
}

#[tokio::test]
async fn test_create_product_with_comma_price_and_image() {
    let ctx = TestContext::new().await;
    ctx.login_admin("admin").await;

    let response = ctx
        .client
        .post(ctx.url("/admin/products/new"))
        .multipart(product_form("Disjuntor 32A", "199,90").part("image", jpeg("disjuntor.JPG")))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/admin/products");

    let products = ctx.state.products().list_all().await.unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].price, Price::parse("199.90").unwrap());
    let image = products[0].image.clone().unwrap();
    assert!(image.ends_with("_disjuntor.jpg"));
    assert!(ctx.upload_dir().join(&image).exists());

    let list = ctx.get_text("/admin/products").await;
    assert!(list.contains("Produto criado com sucesso!"));
    assert!(list.contains("R$ 199,90"));

    let served = ctx
        .client
        .get(ctx.url(&format!("/uploads/{image}")))
        .send()
        .await
        .unwrap();
    assert_eq!(served.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_edit_product_with_comma_price_replaces_image() {
    let ctx = TestContext::new().await;
    ctx.login_admin("admin").await;

    ctx.client
        .post(ctx.url("/admin/products/new"))
        .multipart(product_form("Disjuntor 32A", "150").part("image", jpeg("antigo.jpg")))
        .send()
        .await
        .unwrap();
    let product = ctx.state.products().list_all().await.unwrap().remove(0);
    let old_image = product.image.clone().unwrap();

    let form = ctx.get_text(&format!("/admin/products/edit/{}", product.id)).await;
    assert!(form.contains("Disjuntor 32A"));

    let response = ctx
        .client
        .post(ctx.url(&format!("/admin/products/edit/{}", product.id)))
        .multipart(product_form("Disjuntor 32A", "199,90").part("image", jpeg("novo.jpg")))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/admin/products");

    let updated = ctx.state.products().find(product.id).await.unwrap().unwrap();
    assert_eq!(updated.price, Price::parse("199.90").unwrap());
    let new_image = updated.image.clone().unwrap();
    assert!(new_image.ends_with("_novo.jpg"));
    assert!(ctx.upload_dir().join(&new_image).exists());
    assert!(!ctx.upload_dir().join(&old_image).exists());

    assert!(ctx.get_text("/admin/products").await.contains("Produto atualizado com sucesso!"));
}

#[tokio::test]
async fn test_price_beyond_column_is_an_inline_error() {
    let ctx = TestContext::new().await;
    ctx.login_admin("admin").await;

    let response = ctx
        .client
        .post(ctx.url("/admin/products/new"))
        .multipart(product_form("Quadro de distribuição", "100000000"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.text().await.unwrap().contains("O preço deve ser menor que"));
    assert_eq!(ctx.state.products().count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_invalid_product_form_is_rerendered() {
    let ctx = TestContext::new().await;
    ctx.login_admin("admin").await;

    let response = ctx
        .client
        .post(ctx.url("/admin/products/new"))
        .multipart(product_form("X", "abc").part(
            "image",
            Part::bytes(vec![1, 2, 3]).file_name("animacao.gif"),
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.text().await.unwrap();
    assert!(body.contains("O nome deve ter entre 2 e 100 caracteres."));
    assert!(body.contains("Informe um preço válido"));
    assert!(body.contains("Apenas imagens JPG, JPEG ou PNG são permitidas."));
    assert_eq!(ctx.state.products().count().await.unwrap(), 0);
    assert_eq!(std::fs::read_dir(ctx.upload_dir()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_delete_product_with_missing_image_file() {
    let ctx = TestContext::new().await;
    ctx.login_admin("admin").await;

    ctx.client
        .post(ctx.url("/admin/products/new"))
        .multipart(product_form("Tomada 20A", "12,50").part("image", jpeg("tomada.jpg")))
        .send()
        .await
        .unwrap();
    let product = ctx.state.products().list_all().await.unwrap().remove(0);
    std::fs::remove_file(ctx.upload_dir().join(product.image.as_ref().unwrap())).unwrap();

    let response = ctx
        .client
        .post(ctx.url(&format!("/admin/products/delete/{}", product.id)))
        .send()
        .await
        .unwrap();
    assert_eq!(location(&response), "/admin/products");
    assert_eq!(ctx.state.products().count().await.unwrap(), 0);
    assert!(ctx.get_text("/admin/products").await.contains("Produto excluído com sucesso!"));
}

#[tokio::test]
async fn test_edit_unknown_product_flashes_not_found() {
    let ctx = TestContext::new().await;
    ctx.login_admin("admin").await;

    let response = ctx
        .client
        .get(ctx.url("/admin/products/edit/42"))
        .send()
        .await
        .unwrap();
    assert_eq!(location(&response), "/admin/products");
    assert!(ctx.get_text("/admin/products").await.contains("Produto não encontrado."));
}

#[tokio::test]
async fn test_duplicate_slug_is_rejected() {
    let ctx = TestContext::new().await;
    ctx.login_admin("admin").await;

    let first = ctx
        .client
        .post(ctx.url("/admin/blog/new"))
        .multipart(post_form("Como escolher um disjuntor", ""))
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::SEE_OTHER);

    let posts = ctx.state.blog_posts().list_all().await.unwrap();
    assert_eq!(posts[0].slug.as_str(), "como-escolher-um-disjuntor");
    assert_eq!(posts[0].author_id.map(|id| id.as_i32()), Some(1));

    let second = ctx
        .client
        .post(ctx.url("/admin/blog/new"))
        .multipart(post_form("Outro título", "como-escolher-um-disjuntor").part("image", jpeg("capa.jpg")))
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::OK);
    assert!(second.text().await.unwrap().contains("Já existe um post com este slug."));

    assert_eq!(ctx.state.blog_posts().count().await.unwrap(), 1);
    assert_eq!(std::fs::read_dir(ctx.upload_dir()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_update_post_keeps_image_and_changes_slug() {
    let ctx = TestContext::new().await;
    ctx.login_admin("admin").await;

    ctx.client
        .post(ctx.url("/admin/blog/new"))
        .multipart(post_form("Dicas de iluminação", "").part("image", jpeg("luz.jpg")))
        .send()
        .await
        .unwrap();
    let post = ctx.state.blog_posts().list_all().await.unwrap().remove(0);

    let response = ctx
        .client
        .post(ctx.url(&format!("/admin/blog/edit/{}", post.id)))
        .multipart(post_form("Dicas de iluminação LED", "iluminacao-led"))
        .send()
        .await
        .unwrap();
    assert_eq!(location(&response), "/admin/blog");

    let updated = ctx.state.blog_posts().find(post.id).await.unwrap().unwrap();
    assert_eq!(updated.slug.as_str(), "iluminacao-led");
    assert_eq!(updated.image, post.image);
    assert!(updated.updated_at >= post.updated_at);

    let public = ctx.client.get(ctx.url("/blog/iluminacao-led")).send().await.unwrap();
    assert_eq!(public.status(), StatusCode::OK);
}
