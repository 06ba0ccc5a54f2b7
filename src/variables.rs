use std::env;

/// Shell variables in assignment order.
#[derive(Debug, Default)]
pub struct Variables {
    vars: Vec<(String, String)>,
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: &str, value: &str) {
        match self.vars.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = value.to_string(),
            None => self.vars.push((name.to_string(), value.to_string())),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.vars.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Handle `NAME=value`. Returns false when `line` is not an assignment.
    pub fn try_assign(&mut self, line: &str) -> bool {
        let Some((name, value)) = line.split_once('=') else {
            return false;
        };
        if !is_valid_name(name) {
            return false;
        }
        self.set(name, value.trim());
        true
    }

    /// Replace `$NAME` with a shell variable, falling back to the
    /// environment. Unknown names are kept as written.
    pub fn expand(&self, input: &str) -> String {
        let mut result = String::new();
        let mut chars = input.chars().peekable();

        while let Some(ch) = chars.next() {
            if ch != '$' {
                result.push(ch);
                continue;
            }

            let mut var_name = String::new();
            while let Some(&next_ch) = chars.peek() {
                if next_ch.is_ascii_alphanumeric() || next_ch == '_' {
                    var_name.push(next_ch);
                    chars.next();
                } else {
                    break;
                }
            }

            if var_name.is_empty() {
                result.push('$');
            } else if let Some(value) = self.get(&var_name) {
                result.push_str(value);
            } else if let Ok(value) = env::var(&var_name) {
                result.push_str(&value);
            } else {
                result.push('$');
                result.push_str(&var_name);
            }
        }

        result
    }
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
