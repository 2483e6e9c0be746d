use hypertext::prelude::*;

/// A row of link buttons, e.g. the export links above the admin tables.
pub struct Actions<'r> {
    pub options: &'r [(&'r str, &'r str)],
}

impl<'r> Renderable for Actions<'r> {
    fn render_to(
        &self,
        buffer: &mut hypertext::Buffer<hypertext::context::Node>,
    ) {
        maud! {
            div class="actions" {
                @for (link, text) in self.options {
                    a class="btn btn-secondary" href=(link) {
                        (text)
                    }
                }
            }
        }
        .render_to(buffer);
    }
}
