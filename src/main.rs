//! Playbot 主入口
//!
//! 终端界面：一次处理一行输入，处理完成后再读取下一行。

use playbot_lib::commands::{self, split_caption_input, Command, Event};
use playbot_lib::{AppConfig, AppState, Reply, SelectedMode};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志（输出到 stderr，避免和对话内容混在一起）
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::from_default_env()
                .add_directive("playbot=info".parse()?)
                .add_directive("playbot_lib=info".parse()?),
        )
        .init();

    info!("Starting Playbot v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load()?.with_env_overrides();
    if !config.api.has_api_key() {
        warn!(
            "No API key configured; set {} or api.api_key in {}",
            playbot_lib::config::API_KEY_ENV,
            AppConfig::config_path()?.display()
        );
    }

    let mut state = AppState::new(config)?;

    println!("Institute of Technology of Cambodia");
    println!("Department of AMS");
    println!("🤖 Play With Chat Bot 📊");
    println!();
    println!("{}", commands::help_text());
    println!();
    println!("{}", state.session.selected_mode().title());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        let mode = state.session.selected_mode();
        stdout.write_all(format!("[{}] > ", mode.short_name()).as_bytes()).await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                println!("{}", Reply::Warning(e));
                continue;
            }
        };

        let event = match command {
            Command::Quit => break,
            Command::Help => {
                println!("{}", commands::help_text());
                continue;
            }
            Command::Mode(mode) => Event::SelectMode(mode),
            Command::Clear => Event::ClearChat,
            Command::History => Event::ShowHistory,
            Command::Input(input) if mode == SelectedMode::ImageCaptioning => {
                match caption_event(&input).await {
                    Ok(event) => event,
                    Err(message) => {
                        println!("{}", Reply::Warning(message));
                        continue;
                    }
                }
            }
            Command::Input(input) => Event::SubmitText(input),
        };

        let reply = commands::dispatch(&mut state, event).await;
        if reply != Reply::Nothing {
            println!("{}", reply);
        }
    }

    info!("Playbot exiting");
    Ok(())
}

/// 读取图片文件，构造图片描述事件
async fn caption_event(input: &str) -> Result<Event, String> {
    let (path, prompt) = split_caption_input(input);

    let image = match path {
        Some(path) => Some(
            tokio::fs::read(path)
                .await
                .map_err(|e| format!("Could not read image '{}': {}", path, e))?,
        ),
        None => None,
    };

    Ok(Event::SubmitImage {
        image,
        prompt: prompt.map(str::to_string),
    })
}
