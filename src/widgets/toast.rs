//! Transient notifications.
//!
//! A toast is appended to `#toast-container` out of band, so any htmx
//! response can carry one next to its main content. Dismissal (after
//! [`TOAST_DURATION_MS`], paused while hovered) is done by the page script.

use hypertext::prelude::*;

pub const TOAST_DURATION_MS: u32 = 3000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Success,
    Error,
}

impl ToastKind {
    fn class(&self) -> &'static str {
        match self {
            ToastKind::Info => "toast toast-info",
            ToastKind::Success => "toast toast-success",
            ToastKind::Error => "toast toast-error",
        }
    }

    fn icon(&self) -> &'static str {
        match self {
            ToastKind::Info => "i",
            ToastKind::Success => "✓",
            ToastKind::Error => "✕",
        }
    }
}

pub struct Toast<'a> {
    pub kind: ToastKind,
    pub title: Option<&'a str>,
    pub message: &'a str,
}

impl<'a> Toast<'a> {
    pub fn info(message: &'a str) -> Self {
        Self {
            kind: ToastKind::Info,
            title: None,
            message,
        }
    }

    pub fn error(title: &'a str, message: &'a str) -> Self {
        Self {
            kind: ToastKind::Error,
            title: Some(title),
            message,
        }
    }

    pub fn success(title: &'a str, message: &'a str) -> Self {
        Self {
            kind: ToastKind::Success,
            title: Some(title),
            message,
        }
    }
}

impl Renderable for Toast<'_> {
    fn render_to(
        &self,
        buffer: &mut hypertext::Buffer<hypertext::context::Node>,
    ) {
        maud! {
            div hx-swap-oob="beforeend:#toast-container" {
                div class=(self.kind.class())
                    role="status"
                    data-duration=(TOAST_DURATION_MS.to_string()) {
                    span class="toast-icon" { (self.kind.icon()) }
                    div class="toast-content" {
                        @if let Some(title) = self.title {
                            div class="toast-title" { (title) }
                        }
                        div class="toast-message" { (self.message) }
                    }
                    button type="button" class="toast-close" "aria-label"="关闭通知" {
                        "✕"
                    }
                }
            }
        }
        .render_to(buffer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_out_of_band() {
        let html = Toast::error("人数限制", "最多只能添加5个成员")
            .render()
            .into_inner();
        assert!(html.contains(r#"hx-swap-oob="beforeend:#toast-container""#));
        assert!(html.contains("toast toast-error"));
        assert!(html.contains("人数限制"));
        assert!(html.contains("最多只能添加5个成员"));
        assert!(html.contains("关闭通知"));
    }

    #[test]
    fn title_is_optional() {
        let html = Toast::info("已保存").render().into_inner();
        assert!(html.contains("toast toast-info"));
        assert!(!html.contains("toast-title"));
    }
}
