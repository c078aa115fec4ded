use flagdeck::explorer::{self, Explorer, ExplorerCall};
use flagdeck::{ClientBuilder, ToastQueue};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let api_key = std::env::args().nth(1).unwrap_or_else(|| "<API_KEY>".to_string());
    let project_id = std::env::args().nth(2).unwrap_or_else(|| "<PROJECT_ID>".to_string());

    let client = ClientBuilder::from_env().build()?;
    let call = ExplorerCall::ProjectDetails { api_key, project_id };

    println!("{}", call.curl(client.base_url()));

    let mut notices = ToastQueue::new();
    let body = Explorer::new(&client).call(&call, &mut notices).await;
    println!("{}", serde_json::to_string_pretty(&body)?);

    if let ExplorerCall::ProjectDetails { api_key, project_id } = &call {
        println!(
            "public: {}",
            explorer::public_details_url(client.base_url(), api_key, project_id)
        );
    }

    for notice in notices.visible() {
        println!("[{:?}] {}", notice.tone, notice.message);
    }

    Ok(())
}
