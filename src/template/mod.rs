//! Templating code.
//!
//! This defines the [`Page`] item, which wraps the body of every full page
//! with the document head, the navigation bar and the toast container.

use hypertext::{Raw, prelude::*};

pub const SITE_TITLE: &str = "码上AI·2025深信服CoStrict校园挑战赛";

pub struct Page<R: Renderable> {
    body: Option<R>,
    title: Option<String>,
    admin: bool,
}

impl<R: Renderable> Page<R> {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn body(mut self, body: R) -> Self {
        self.body = Some(body);
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Shows the administration links in the navigation bar.
    pub fn admin(mut self) -> Self {
        self.admin = true;
        self
    }
}

impl<R: Renderable> Renderable for Page<R> {
    fn render_to(
        &self,
        buffer: &mut hypertext::Buffer<hypertext::context::Node>,
    ) {
        let title = match &self.title {
            Some(title) => format!("{title} · {SITE_TITLE}"),
            None => format!("团队报名 · {SITE_TITLE}"),
        };

        maud! {
            html lang="zh-CN" {
                head {
                    meta charset="utf-8";
                    title { (title) }
                    script src="https://cdn.jsdelivr.net/npm/htmx.org@2.0.7/dist/htmx.min.js" integrity="sha384-ZBXiYtYQ6hJ2Y0ZNoYuI+Nq5MqWBr+chMrS/RkXpNzQCApHEhOt2aY8EJgqwHLkJ" crossorigin="anonymous" {
                    }
                    style {
                        (Raw::dangerously_create(include_str!("../../assets/style.css")))
                    }
                    meta
                        name="viewport"
                        content="width=device-width, initial-scale=1";
                }
                body {
                    nav class="navbar" {
                        a class="navbar-brand" href="/register" {
                            (SITE_TITLE)
                        }
                        @if self.admin {
                            ul class="navbar-nav" {
                                li { a href="/admin/teams" { "团队" } }
                                li { a href="/admin/members" { "成员" } }
                                li { a href="/admin/config" { "配置" } }
                                li {
                                    form method="post" action="/admin/logout" {
                                        button type="submit" class="btn-link" { "退出" }
                                    }
                                }
                            }
                        }
                    }
                    main class="container" {
                        @if let Some(body) = &self.body {
                            (body)
                        }
                    }
                    div id="toast-container" class="toast-container" "aria-live"="polite" {}
                    script {
                        (Raw::dangerously_create(include_str!("../../assets/page.js")))
                    }
                }
            }
        }.render_to(buffer)
    }
}

impl<R: Renderable> Default for Page<R> {
    fn default() -> Self {
        Self {
            body: None,
            title: None,
            admin: false,
        }
    }
}
