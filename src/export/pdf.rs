use pdf_writer::{Content, Name, Pdf, Rect, Ref, Str};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Small A4 document writer: text lines and tables flowing over pages.
pub struct PdfManager {
    pdf: Pdf,
    catalog_id: Ref,
    pages_id: Ref,
    page_refs: Vec<Ref>,

    page: Option<(Ref, Content)>,
    cursor_y: f32,
    title: String,

    page_w: f32,
    page_h: f32,
    margin: f32,
    row_h: f32,

    next_id: i32,
    font_id: Ref,

    font_size: f32,
    header_font_size: f32,
    title_font_size: f32,
}

/// Helvetica only covers Latin-1; fold what the base font cannot show.
fn pdf_text(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            ' '..='~' => c as u8,
            'á' | 'à' | 'ä' | 'â' => b'a',
            'é' | 'è' | 'ë' | 'ê' => b'e',
            'í' | 'ì' | 'ï' | 'î' => b'i',
            'ó' | 'ò' | 'ö' | 'ô' => b'o',
            'ú' | 'ù' | 'ü' | 'û' => b'u',
            'ñ' => b'n',
            'Á' | 'À' | 'Ä' | 'Â' => b'A',
            'É' | 'È' | 'Ë' | 'Ê' => b'E',
            'Í' | 'Ì' | 'Ï' | 'Î' => b'I',
            'Ó' | 'Ò' | 'Ö' | 'Ô' => b'O',
            'Ú' | 'Ù' | 'Ü' | 'Û' => b'U',
            'Ñ' => b'N',
            _ => b'?',
        })
        .collect()
}

impl PdfManager {
    pub fn new(title: &str) -> Self {
        let mut pdf = Pdf::new();

        let catalog_id = Ref::new(1);
        let pages_id = Ref::new(2);
        let font_id = Ref::new(3);

        pdf.type1_font(font_id).base_font(Name(b"Helvetica"));

        Self {
            pdf,
            catalog_id,
            pages_id,
            page_refs: Vec::new(),

            page: None,
            cursor_y: 0.0,
            title: title.to_string(),

            page_w: 595.0,
            page_h: 842.0,
            margin: 50.0,
            row_h: 20.0,

            next_id: 4,
            font_id,

            font_size: 10.0,
            header_font_size: 11.0,
            title_font_size: 16.0,
        }
    }

    fn fresh_ref(&mut self) -> Ref {
        let id = self.next_id;
        self.next_id += 1;
        Ref::new(id)
    }

    /// Close the current page (if any) and start a new one.
    fn start_page(&mut self) {
        self.finish_page();

        let page_id = self.fresh_ref();
        let content_id = self.fresh_ref();
        self.page_refs.push(page_id);

        {
            let mut page = self.pdf.page(page_id);
            page.parent(self.pages_id)
                .media_box(Rect::new(0.0, 0.0, self.page_w, self.page_h))
                .contents(content_id);
            page.resources().fonts().pair(Name(b"F1"), self.font_id);
        }

        let mut content = Content::new();
        let number = self.page_refs.len();
        let title_y = self.page_h - self.margin + 15.0;
        let title = self.title.clone();
        self.draw_text(&mut content, self.margin, title_y, self.title_font_size, &title);
        self.draw_text(
            &mut content,
            self.page_w - self.margin - 60.0,
            self.margin - 35.0,
            self.font_size,
            &format!("Page {number}"),
        );

        self.page = Some((content_id, content));
        self.cursor_y = self.page_h - self.margin - 20.0;
    }

    fn finish_page(&mut self) {
        if let Some((id, content)) = self.page.take() {
            self.pdf.stream(id, &content.finish());
        }
    }

    /// Make room for `height` points, breaking the page when needed.
    fn reserve(&mut self, height: f32) {
        if self.page.is_none() || self.cursor_y - height < self.margin {
            self.start_page();
        }
    }

    fn draw_text(&self, content: &mut Content, x: f32, y: f32, size: f32, text: &str) {
        let bytes = pdf_text(text);
        content.begin_text();
        content.set_font(Name(b"F1"), size);
        content.set_text_matrix([1.0, 0.0, 0.0, 1.0, x, y]);
        content.show(Str(&bytes));
        content.end_text();
    }

    fn fill_band(&mut self, y: f32, width: f32, rgb: (f32, f32, f32)) {
        let (x, h) = (self.margin, self.row_h);
        if let Some((_, content)) = self.page.as_mut() {
            content.save_state();
            content.set_fill_rgb(rgb.0, rgb.1, rgb.2);
            content.rect(x, y, width, h);
            content.fill_nonzero();
            content.restore_state();
        }
    }

    fn draw_row(&mut self, y: f32, col_widths: &[f32], row: &[String], font_size: f32) {
        let Some((id, mut content)) = self.page.take() else {
            return;
        };
        let mut x = self.margin;
        for (text, w) in row.iter().zip(col_widths) {
            self.draw_text(&mut content, x + 4.0, y + 5.0, font_size, text);
            content.save_state();
            content.set_stroke_rgb(0.65, 0.65, 0.65);
            content.rect(x, y, *w, self.row_h);
            content.stroke();
            content.restore_state();
            x += w;
        }
        self.page = Some((id, content));
    }

    /// Column widths from header and content, scaled down to the page.
    fn compute_col_widths(&self, headers: &[&str], rows: &[Vec<String>]) -> Vec<f32> {
        let mut widths: Vec<f32> = headers
            .iter()
            .map(|h| h.chars().count() as f32 * 6.5 + 8.0)
            .collect();

        for row in rows {
            for (i, cell) in row.iter().enumerate().take(widths.len()) {
                widths[i] = (cell.chars().count() as f32 * 6.2 + 8.0).max(widths[i]);
            }
        }

        let total: f32 = widths.iter().sum();
        let max = self.page_w - 2.0 * self.margin;
        if total > max {
            let scale = max / total;
            for w in &mut widths {
                *w *= scale;
            }
        }
        widths
    }

    /// One line of running text.
    pub fn line(&mut self, text: &str, size: f32) {
        let step = size + 6.0;
        self.reserve(step);
        self.cursor_y -= step;
        let (x, y) = (self.margin, self.cursor_y);
        if let Some((id, mut content)) = self.page.take() {
            self.draw_text(&mut content, x, y, size, text);
            self.page = Some((id, content));
        }
    }

    pub fn text(&mut self, text: &str) {
        self.line(text, self.header_font_size);
    }

    pub fn gap(&mut self, height: f32) {
        self.cursor_y -= height;
    }

    /// Table with shaded header and zebra rows. The header is repeated on
    /// every page the table spills over to.
    pub fn table(&mut self, headers: &[&str], rows: &[Vec<String>]) {
        let col_widths = self.compute_col_widths(headers, rows);
        let width: f32 = col_widths.iter().sum();
        let header_row: Vec<String> = headers.iter().map(|s| s.to_string()).collect();

        let draw_header = |me: &mut Self| {
            me.cursor_y -= me.row_h;
            let y = me.cursor_y;
            me.fill_band(y, width, (0.85, 0.87, 0.90));
            me.draw_row(y, &col_widths, &header_row, me.header_font_size);
        };

        self.reserve(2.0 * self.row_h);
        draw_header(self);

        for (i, row) in rows.iter().enumerate() {
            if self.cursor_y - self.row_h < self.margin {
                self.start_page();
                draw_header(self);
            }
            self.cursor_y -= self.row_h;
            let y = self.cursor_y;
            if i % 2 == 0 {
                self.fill_band(y, width, (0.96, 0.96, 0.96));
            }
            self.draw_row(y, &col_widths, row, self.font_size);
        }
    }

    pub fn save(mut self, path: &Path) -> std::io::Result<()> {
        if self.page_refs.is_empty() {
            self.start_page();
        }
        self.finish_page();

        self.pdf.catalog(self.catalog_id).pages(self.pages_id);
        {
            let mut pages = self.pdf.pages(self.pages_id);
            pages.count(self.page_refs.len() as i32);
            pages.kids(self.page_refs.iter().copied());
        }

        let bytes = self.pdf.finish();
        let mut f = File::create(path)?;
        f.write_all(&bytes)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_accents_for_the_base_font() {
        assert_eq!(pdf_text("Peña Ángel"), b"Pena Angel".to_vec());
        assert_eq!(pdf_text("8,00h"), b"8,00h".to_vec());
    }
}
