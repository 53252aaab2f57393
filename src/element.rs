use chromiumoxide::element::Element as CrElement;

use crate::error::{Error, Result};

/// Wrapper around a chromiumoxide Element, providing the interactions the
/// field filler needs.
pub struct Element {
    inner: CrElement,
}

impl Element {
    pub(crate) fn new(inner: CrElement) -> Self {
        Self { inner }
    }

    /// Returns a reference to the underlying chromiumoxide Element.
    pub fn inner(&self) -> &CrElement {
        &self.inner
    }

    /// Click this element (scrolls into view first).
    pub async fn click(&self) -> Result<()> {
        self.inner.click().await.map_err(Error::CdpError)?;
        Ok(())
    }

    /// Type text into this element via synthetic keystrokes.
    pub async fn type_text(&self, text: &str) -> Result<()> {
        self.inner.type_str(text).await.map_err(Error::CdpError)?;
        Ok(())
    }

    /// Press a key on this element (e.g. "Enter", "Escape").
    pub async fn press_key(&self, key: &str) -> Result<()> {
        self.inner.press_key(key).await.map_err(Error::CdpError)?;
        Ok(())
    }

    /// Focus this element.
    pub async fn focus(&self) -> Result<()> {
        self.inner.focus().await.map_err(Error::CdpError)?;
        Ok(())
    }

    /// Get the inner text of this element. Empty text is not an error.
    pub async fn inner_text(&self) -> Result<String> {
        Ok(self
            .inner
            .inner_text()
            .await
            .map_err(Error::CdpError)?
            .unwrap_or_default())
    }

    /// Get the value of an attribute on this element.
    pub async fn get_attribute(&self, name: &str) -> Result<Option<String>> {
        self.inner.attribute(name).await.map_err(Error::CdpError)
    }

    /// Whether this element is currently checked. Covers native checkboxes
    /// (the `checked` property) and ARIA widgets (`aria-checked`).
    pub async fn is_checked(&self) -> Result<bool> {
        let value = self
            .call_js(
                "function() { return this.checked === true \
                 || this.getAttribute('aria-checked') === 'true'; }",
            )
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    /// Clear the current value, notifying the page's own listeners.
    pub async fn clear_value(&self) -> Result<()> {
        self.call_js(
            "function() { this.value = ''; \
             this.dispatchEvent(new Event('input', { bubbles: true })); }",
        )
        .await?;
        Ok(())
    }

    /// Set the value directly, as a native date input expects, firing the
    /// input and change events a real edit would.
    pub async fn set_value(&self, value: &str) -> Result<()> {
        let literal = serde_json::to_string(value).map_err(|e| Error::JsError(e.to_string()))?;
        let js = format!(
            "function() {{ this.value = {literal}; \
             this.dispatchEvent(new Event('input', {{ bubbles: true }})); \
             this.dispatchEvent(new Event('change', {{ bubbles: true }})); }}"
        );
        self.call_js(&js).await?;
        Ok(())
    }

    /// Call a JS function with this element bound to `this`, returning the
    /// result value (Null when the function returns nothing).
    async fn call_js(&self, function: &str) -> Result<serde_json::Value> {
        let returns = self
            .inner
            .call_js_fn(function, false)
            .await
            .map_err(Error::CdpError)?;
        Ok(returns.result.value.unwrap_or(serde_json::Value::Null))
    }
}
