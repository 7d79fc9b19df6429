//! Line-oriented rendition of the product list and its forms.
//!
//! Filter edits only touch the draft; `apply` commits it and fetches once.
//! Every product command requires a signed-in session.

use std::io::Write;
use std::sync::Arc;

use catalog_app::products::{
    CatalogView, Category, FilterEdit, Product, ProductFilter, ProductForm, ProductService,
};
use catalog_app::Catalog;
use catalog_authz::AuthContext;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

const HELP: &str = "\
commands:
  signup <email> <password>    create an account and sign in
  login <email> <password>     sign in
  logout | whoami
  filter category|min-price|max-price|min-rating|search <value|any>
  filter show | filter clear
  apply                        commit the draft filter and fetch
  list | refresh
  create | edit <id> | delete <id>
  help | quit";

pub struct Shell<R, W> {
    auth: AuthContext,
    service: Arc<ProductService>,
    view: CatalogView,
    input: R,
    output: W,
}

impl<R, W> Shell<R, W>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    pub fn new(catalog: &Catalog, input: R, output: W) -> Self {
        Self {
            auth: catalog.auth_context(),
            service: catalog.products.clone(),
            view: CatalogView::new(catalog.products.clone()),
            input,
            output,
        }
    }

    /// Read commands until `quit` or end of input.
    pub async fn run(mut self) -> anyhow::Result<()> {
        writeln!(self.output, "catalog shell; type 'help' for commands")?;
        while let Some(line) = self.prompt("> ").await? {
            let words: Vec<&str> = line.split_whitespace().collect();
            match words.as_slice() {
                [] => {}
                ["quit"] | ["exit"] => break,
                ["help"] => writeln!(self.output, "{}", HELP)?,
                _ => self.dispatch(&words).await?,
            }
        }
        Ok(())
    }

    async fn dispatch(&mut self, words: &[&str]) -> anyhow::Result<()> {
        let signed_in = self.auth.user().await.is_some();
        match words {
            ["signup", email, password] => self.sign_in(email, password, true).await,
            ["login", email, password] => self.sign_in(email, password, false).await,
            ["logout"] => {
                if let Err(err) = self.auth.sign_out().await {
                    writeln!(self.output, "error: {}", err)?;
                }
                self.view = CatalogView::new(self.service.clone());
                writeln!(self.output, "signed out")?;
                Ok(())
            }
            ["whoami"] => {
                match self.auth.user().await {
                    Some(user) => writeln!(self.output, "{}", user.email)?,
                    None => writeln!(self.output, "not signed in")?,
                }
                Ok(())
            }
            _ if !signed_in => {
                writeln!(self.output, "sign in required")?;
                Ok(())
            }
            ["filter", "show"] => {
                let filters = self.view.filters();
                let draft = describe(filters.draft());
                let committed = describe(filters.committed());
                writeln!(self.output, "draft: {}", draft)?;
                writeln!(self.output, "applied: {}", committed)?;
                Ok(())
            }
            ["filter", "clear"] => {
                self.view.clear_filter();
                writeln!(self.output, "draft cleared")?;
                Ok(())
            }
            ["filter", field, rest @ ..] if !rest.is_empty() => {
                match parse_edit(field, &rest.join(" ")) {
                    Ok(edit) => self.view.edit_filter(edit),
                    Err(message) => writeln!(self.output, "error: {}", message)?,
                }
                Ok(())
            }
            ["apply"] => {
                let result = self.view.apply_filters().await.map(|_| ());
                self.report(result)
            }
            ["refresh"] => {
                let result = self.view.refresh().await.map(|_| ());
                self.report(result)
            }
            ["list"] => self.render(),
            ["create"] => self.create().await,
            ["edit", id] => self.edit(id).await,
            ["delete", id] => self.delete(id).await,
            _ => {
                writeln!(self.output, "unknown command; type 'help'")?;
                Ok(())
            }
        }
    }

    async fn sign_in(&mut self, email: &str, password: &str, new: bool) -> anyhow::Result<()> {
        let outcome = if new {
            self.auth.sign_up(email, password).await
        } else {
            self.auth.sign_in(email, password).await
        };
        match outcome {
            Ok(user) => {
                writeln!(self.output, "signed in as {}", user.email)?;
                let result = self.view.refresh().await.map(|_| ());
                self.report(result)
            }
            Err(err) => {
                writeln!(self.output, "error: {}", err)?;
                Ok(())
            }
        }
    }

    async fn create(&mut self) -> anyhow::Result<()> {
        let Some(form) = self.read_form(&ProductForm::default(), false).await? else {
            return Ok(());
        };
        match self.view.submit_create(&form).await {
            Ok(product) => {
                writeln!(self.output, "created {}", product.id)?;
                self.report_stale_list()?;
            }
            Err(err) => writeln!(self.output, "error: {}", err)?,
        }
        Ok(())
    }

    async fn edit(&mut self, id: &str) -> anyhow::Result<()> {
        let product = match self.view.load(id).await {
            Ok(product) => product,
            Err(err) => {
                writeln!(self.output, "error: {}", err)?;
                return Ok(());
            }
        };
        let current = ProductForm::from_product(&product);
        let Some(form) = self.read_form(&current, true).await? else {
            return Ok(());
        };
        match self.view.submit_edit(&product, &form).await {
            Ok(product) => {
                writeln!(self.output, "updated {}", product.id)?;
                self.report_stale_list()?;
            }
            Err(err) => writeln!(self.output, "error: {}", err)?,
        }
        Ok(())
    }

    async fn delete(&mut self, id: &str) -> anyhow::Result<()> {
        let answer = self.prompt(&format!("delete {}? [y/N] ", id)).await?;
        let confirmed = matches!(
            answer.as_deref().map(|a| a.trim().to_lowercase()).as_deref(),
            Some("y") | Some("yes")
        );
        if !confirmed {
            writeln!(self.output, "cancelled")?;
            return Ok(());
        }
        match self.view.confirm_delete(id).await {
            Ok(()) => {
                writeln!(self.output, "deleted {}", id)?;
                self.report_stale_list()?;
            }
            Err(err) => writeln!(self.output, "error: {}", err)?,
        }
        Ok(())
    }

    /// The change went through but the list shown may be out of date.
    fn report_stale_list(&mut self) -> anyhow::Result<()> {
        if let Some(err) = self.view.last_error() {
            writeln!(self.output, "warning: list not refreshed: {}", err)?;
        }
        Ok(())
    }

    /// Prompt for each field. With `keep_blank`, an empty answer keeps the current value.
    async fn read_form(
        &mut self,
        current: &ProductForm,
        keep_blank: bool,
    ) -> anyhow::Result<Option<ProductForm>> {
        let mut form = current.clone();
        let fields: [(&str, &mut String); 5] = [
            ("name", &mut form.name),
            ("description", &mut form.description),
            ("category", &mut form.category),
            ("price", &mut form.price),
            ("rating", &mut form.rating),
        ];
        for (label, value) in fields {
            let text = if keep_blank {
                format!("{} [{}]: ", label, value)
            } else {
                format!("{}: ", label)
            };
            let Some(answer) = self.prompt(&text).await? else {
                return Ok(None);
            };
            if !(keep_blank && answer.is_empty()) {
                *value = answer;
            }
        }
        Ok(Some(form))
    }

    fn render(&mut self) -> anyhow::Result<()> {
        let products = self.view.products();
        if products.is_empty() {
            writeln!(self.output, "no products")?;
            return Ok(());
        }
        for product in products {
            writeln!(self.output, "{}", row(product))?;
        }
        Ok(())
    }

    /// Print a fetch outcome. On failure the previous list stays on screen.
    fn report<E: std::fmt::Display>(&mut self, result: Result<(), E>) -> anyhow::Result<()> {
        match result {
            Ok(()) => {
                let count = self.view.products().len();
                writeln!(self.output, "{} product(s)", count)?;
                self.render()
            }
            Err(err) => {
                writeln!(self.output, "error: {}", err)?;
                Ok(())
            }
        }
    }

    async fn prompt(&mut self, text: &str) -> anyhow::Result<Option<String>> {
        write!(self.output, "{}", text)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(&['\r', '\n'][..]).to_string()))
    }
}

fn parse_edit(field: &str, value: &str) -> Result<FilterEdit, String> {
    let value = value.trim();
    let cleared = value.eq_ignore_ascii_case("any");
    let number = || -> Result<Option<f64>, String> {
        if cleared {
            return Ok(None);
        }
        value
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(Some)
            .ok_or_else(|| format!("'{}' is not a number", value))
    };

    match field {
        "category" if cleared => Ok(FilterEdit::Category(None)),
        "category" => value
            .parse::<Category>()
            .map(|c| FilterEdit::Category(Some(c)))
            .map_err(|_| format!("unknown category '{}'", value)),
        "min-price" => number().map(FilterEdit::MinPrice),
        "max-price" => number().map(FilterEdit::MaxPrice),
        "min-rating" => number().map(FilterEdit::MinRating),
        "search" if cleared => Ok(FilterEdit::Search(None)),
        "search" => Ok(FilterEdit::Search(Some(value.to_string()))),
        other => Err(format!("unknown filter '{}'", other)),
    }
}

fn describe(filter: &ProductFilter) -> String {
    let mut parts = Vec::new();
    if let Some(category) = filter.category {
        parts.push(format!("category={}", category));
    }
    if let Some(min) = filter.min_price {
        parts.push(format!("min-price={}", min));
    }
    if let Some(max) = filter.max_price {
        parts.push(format!("max-price={}", max));
    }
    if let Some(rating) = filter.min_rating {
        parts.push(format!("min-rating={}", rating));
    }
    if let Some(text) = filter.search_term() {
        parts.push(format!("search={:?}", text));
    }
    if parts.is_empty() {
        "(none)".to_string()
    } else {
        parts.join(" ")
    }
}

fn row(product: &Product) -> String {
    format!(
        "{}  {}  {}  {:.2}  {:.1}",
        product.id, product.name, product.category, product.price, product.rating
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_kernel::settings::Settings;

    async fn run_script(script: &str) -> String {
        let catalog = Catalog::from_settings(Settings::default()).unwrap();
        let mut output = Vec::new();
        Shell::new(&catalog, script.as_bytes(), &mut output)
            .run()
            .await
            .unwrap();
        String::from_utf8(output).unwrap()
    }

    #[tokio::test]
    async fn products_require_sign_in() {
        let out = run_script("list\napply\n").await;
        assert_eq!(out.matches("sign in required").count(), 2);
    }

    #[tokio::test]
    async fn create_filter_apply_flow() {
        let out = run_script(
            "signup dev@example.com devpass\n\
             create\nNovel\nA long story\nbooks\n12\n4.5\n\
             create\nToaster\nMakes toast\nHome\n30\n4\n\
             filter category Books\n\
             filter show\n\
             apply\n\
             quit\n",
        )
        .await;

        assert!(out.contains("signed in as dev@example.com"));
        assert_eq!(out.matches("created ").count(), 2);
        assert!(out.contains("draft: category=Books"));
        assert!(out.contains("applied: (none)"));
        let applied = out.rsplit("1 product(s)").next().unwrap();
        assert!(applied.contains("Novel"));
        assert!(!applied.contains("Toaster"));
    }

    #[tokio::test]
    async fn invalid_create_reports_first_error() {
        let out = run_script(
            "signup dev@example.com devpass\n\
             create\nLamp\nBright\nHome\n-3\n9\n",
        )
        .await;
        assert!(out.contains("error: Price must be a number greater than or equal to 0"));
        assert!(!out.contains("created "));
    }

    #[tokio::test]
    async fn delete_needs_confirmation() {
        let catalog = Catalog::from_settings(Settings::default()).unwrap();
        let created = catalog
            .products
            .create_product(catalog_app::products::ProductDraft {
                name: "Mug".to_string(),
                description: "Holds coffee".to_string(),
                category: Category::Home,
                price: 8.0,
                rating: 3.0,
            })
            .await
            .unwrap();

        let script = format!(
            "signup dev@example.com devpass\ndelete {id}\nn\ndelete {id}\nyes\n",
            id = created.id
        );
        let mut output = Vec::new();
        Shell::new(&catalog, script.as_bytes(), &mut output)
            .run()
            .await
            .unwrap();
        let out = String::from_utf8(output).unwrap();

        assert!(out.contains("cancelled"));
        assert!(out.contains(&format!("deleted {}", created.id)));
        assert!(catalog.products.get_product_by_id(&created.id).await.is_err());
    }

    #[test]
    fn filter_values_parse() {
        assert_eq!(
            parse_edit("min-price", "10"),
            Ok(FilterEdit::MinPrice(Some(10.0)))
        );
        assert_eq!(parse_edit("min-rating", "any"), Ok(FilterEdit::MinRating(None)));
        assert!(parse_edit("max-price", "cheap").is_err());
        assert!(parse_edit("category", "Garden").is_err());
        assert_eq!(
            parse_edit("search", "desk lamp"),
            Ok(FilterEdit::Search(Some("desk lamp".to_string())))
        );
    }
}
