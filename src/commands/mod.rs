//! 界面事件分发
//!
//! 把界面上的操作路由到适配层，并把结果转换为可直接展示的 [`Reply`]。
//! 适配层的错误在这里变成警告提示，会话状态保持不变。

use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, warn};

use crate::ai::{CaptionRequest, ChatMessage, EmbeddingVector};
use crate::session::SelectedMode;
use crate::AppState;

const WARN_NO_IMAGE: &str = "Please upload an image first.";
const WARN_NO_EMBED_TEXT: &str = "Please enter some text to get embeddings.";
const WARN_NO_QUESTION: &str = "Please enter a question to get a response.";

/// 界面事件
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// 切换模式
    SelectMode(SelectedMode),
    /// 清空聊天
    ClearChat,
    /// 查看聊天记录
    ShowHistory,
    /// 当前模式下提交文本
    SubmitText(String),
    /// 提交图片（None 表示未上传）
    SubmitImage {
        image: Option<Vec<u8>>,
        prompt: Option<String>,
    },
}

/// 分发结果
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// 模式已切换
    Mode(SelectedMode),
    /// 一轮聊天：用户消息和模型回复
    Chat {
        prompt: ChatMessage,
        reply: ChatMessage,
    },
    /// 聊天记录
    History(Vec<ChatMessage>),
    /// 聊天已清空
    Cleared,
    Caption(String),
    Embedding(EmbeddingVector),
    Answer(String),
    /// 提示信息，状态未改变
    Warning(String),
    /// 无需展示
    Nothing,
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mode(mode) => write!(f, "{}", mode.title()),
            Self::Chat { reply, .. } => write!(f, "{}: {}", reply.role().display_name(), reply.text()),
            Self::History(messages) if messages.is_empty() => write!(f, "(no messages yet)"),
            Self::History(messages) => {
                for (i, m) in messages.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "[{}] {}: {}", m.time_label(), m.role().display_name(), m.text())?;
                }
                Ok(())
            }
            Self::Cleared => write!(f, "Chat cleared."),
            Self::Caption(caption) => write!(f, "{}", caption),
            Self::Embedding(vector) => write!(f, "{}", vector),
            Self::Answer(answer) => write!(f, "{}", answer),
            Self::Warning(message) => write!(f, "⚠ {}", message),
            Self::Nothing => Ok(()),
        }
    }
}

/// 按当前模式分发一个事件
pub async fn dispatch(state: &mut AppState, event: Event) -> Reply {
    debug!(
        "Dispatch: mode={}, event={}",
        state.session.selected_mode(),
        event_name(&event)
    );

    match event {
        Event::SelectMode(mode) => select_mode(state, mode),
        Event::ClearChat => clear_chat(state),
        Event::ShowHistory => chat_history(state),
        Event::SubmitImage { image, prompt } => generate_caption(state, image, prompt).await,
        Event::SubmitText(text) => match state.session.selected_mode() {
            SelectedMode::ChatBot => send_chat_message(state, &text).await,
            SelectedMode::EmbedText => embed_text(state, &text).await,
            SelectedMode::AskAnything => ask_anything(state, &text).await,
            SelectedMode::ImageCaptioning => Reply::Warning(WARN_NO_IMAGE.to_string()),
        },
    }
}

fn event_name(event: &Event) -> &'static str {
    match event {
        Event::SelectMode(_) => "select_mode",
        Event::ClearChat => "clear_chat",
        Event::ShowHistory => "show_history",
        Event::SubmitText(_) => "submit_text",
        Event::SubmitImage { .. } => "submit_image",
    }
}

/// 切换模式
pub fn select_mode(state: &mut AppState, mode: SelectedMode) -> Reply {
    state.session.set_selected_mode(mode);
    Reply::Mode(mode)
}

/// 发送聊天消息；空输入什么也不做
pub async fn send_chat_message(state: &mut AppState, text: &str) -> Reply {
    if text.trim().is_empty() {
        return Reply::Nothing;
    }

    let session = state.session.get_or_create_chat_session(&state.chat_model);
    match session.send_message(text).await {
        Ok(reply) => {
            let prompt = session.history()[session.len() - 2].clone();
            Reply::Chat { prompt, reply }
        }
        Err(e) => {
            warn!("Chat message failed: {}", e);
            Reply::Warning(e.to_string())
        }
    }
}

/// 清空聊天（创建新的空会话）
pub fn clear_chat(state: &mut AppState) -> Reply {
    state.session.reset_chat_session(&state.chat_model);
    Reply::Cleared
}

/// 当前聊天记录
pub fn chat_history(state: &mut AppState) -> Reply {
    let session = state.session.get_or_create_chat_session(&state.chat_model);
    Reply::History(session.history().to_vec())
}

/// 生成图片描述
pub async fn generate_caption(
    state: &mut AppState,
    image: Option<Vec<u8>>,
    prompt: Option<String>,
) -> Reply {
    let Some(image) = image else {
        return Reply::Warning(WARN_NO_IMAGE.to_string());
    };

    info!("Generating caption for {} byte image", image.len());
    let mut request = CaptionRequest::new(image);
    if let Some(prompt) = prompt {
        request = request.with_prompt(&prompt);
    }

    match state.vision.caption(&request).await {
        Ok(caption) => Reply::Caption(caption),
        Err(e) => {
            warn!("Caption failed: {}", e);
            Reply::Warning(e.to_string())
        }
    }
}

/// 文本嵌入
pub async fn embed_text(state: &mut AppState, text: &str) -> Reply {
    if text.trim().is_empty() {
        return Reply::Warning(WARN_NO_EMBED_TEXT.to_string());
    }

    match state.embedder.embed(text).await {
        Ok(vector) => {
            info!("Embedded {} chars into {} dimensions", text.chars().count(), vector.len());
            Reply::Embedding(vector)
        }
        Err(e) => {
            warn!("Embedding failed: {}", e);
            Reply::Warning(e.to_string())
        }
    }
}

/// 单轮问答，不影响聊天会话
pub async fn ask_anything(state: &mut AppState, text: &str) -> Reply {
    if text.trim().is_empty() {
        return Reply::Warning(WARN_NO_QUESTION.to_string());
    }

    match state.chat_model.complete_text(text).await {
        Ok(answer) => Reply::Answer(answer),
        Err(e) => {
            warn!("Question failed: {}", e);
            Reply::Warning(e.to_string())
        }
    }
}

/// 终端输入的一行
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Mode(SelectedMode),
    Clear,
    History,
    Help,
    Quit,
    /// 当前模式的普通输入
    Input(String),
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let Some(rest) = line.strip_prefix(':') else {
            return Ok(Self::Input(line.to_string()));
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };

        match name {
            "mode" | "m" => arg.parse().map(Self::Mode),
            "clear" => Ok(Self::Clear),
            "history" => Ok(Self::History),
            "help" | "h" | "?" => Ok(Self::Help),
            "quit" | "q" | "exit" => Ok(Self::Quit),
            other => Err(format!("unknown command ':{}', type :help", other)),
        }
    }
}

/// 拆分图片描述输入：`<图片路径> [提示词]`
///
/// 路径含空格时用单引号或双引号括起来，如 `"my photo.png" describe it`。
pub fn split_caption_input(input: &str) -> (Option<&str>, Option<&str>) {
    let input = input.trim();
    if input.is_empty() {
        return (None, None);
    }

    let quoted = input
        .chars()
        .next()
        .filter(|c| *c == '"' || *c == '\'')
        .and_then(|quote| {
            let rest = &input[1..];
            rest.find(quote).map(|end| (&rest[..end], &rest[end + 1..]))
        });

    let (path, prompt) = match quoted {
        Some((path, prompt)) => (path, prompt),
        None => input.split_once(char::is_whitespace).unwrap_or((input, "")),
    };

    let prompt = prompt.trim();
    (
        (!path.is_empty()).then_some(path),
        (!prompt.is_empty()).then_some(prompt),
    )
}

/// 帮助文本
pub fn help_text() -> String {
    let modes: Vec<String> = SelectedMode::ALL
        .iter()
        .map(|m| format!("  {:<8} {}", m.short_name(), m.label()))
        .collect();

    format!(
        "Commands:\n  :mode <name>   switch mode\n  :clear         clear the chat\n  \
         :history       show the chat\n  :help          show this help\n  :quit          exit\n\
         Modes:\n{}\n\
         In caption mode enter `<image-path> [prompt]` (quote paths with spaces); otherwise any line is sent as input.",
        modes.join("\n")
    )
}
