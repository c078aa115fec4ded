use flagdeck::editor::{FlagCreateEditor, ProjectCreateEditor};
use flagdeck::session::LoginForm;
use flagdeck::{AppContext, ClientBuilder, Environment, SortKey};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // Picks up FLAGDECK_API_URL / FLAGDECK_ACCESS_TOKEN when set
    let client = ClientBuilder::from_env().build()?;
    let mut ctx = AppContext::new(client);

    if ctx.init().await.is_none() {
        let mut login = LoginForm::new();
        login.email = "you@example.com".to_string();
        login.password = "your-password".to_string();
        ctx.login(&mut login).await?;
    }

    if let Some(user) = ctx.session() {
        println!("Welcome, {}", user.display_name());
    }

    ctx.load_projects().await?;

    let mut project = ProjectCreateEditor::new();
    project.name = "Checkout".to_string();
    project.description = "Checkout revamp".to_string();
    let created = ctx.create_project(&mut project).await?;

    let mut flag = FlagCreateEditor::new();
    flag.name = "new-checkout-button".to_string();
    flag.description = "Shows the redesigned button".to_string();
    flag.environment = Environment::Staging;
    let new_flag = ctx.create_flag(&created.id, &mut flag).await?;

    let enabled = ctx.toggle_flag(&created.id, &new_flag.id).await?;
    println!("Flag '{}' is now enabled: {}", new_flag.name, enabled);

    println!("Projects:");
    for project in ctx.dashboard().projects().view().sorted_by(SortKey::Name).collect() {
        println!(
            "  {} ({}): {} flags",
            project.name,
            project.id,
            ctx.dashboard().flag_count(&project.id)
        );
        if let Some(url) = ctx.share_url(project) {
            println!("    share: {}", url);
        }
    }

    Ok(())
}
