use std::error::Error;
use std::io::{self, Write};

use crate::core::config::Config;
use crate::core::persona::PersonaId;

pub fn list_personas(config: &Config) -> Result<(), Box<dyn Error>> {
    let default = config.resolve_persona(None).unwrap_or_default();
    let mut stdout = io::stdout();
    write_persona_list(&mut stdout, default)?;
    Ok(())
}

pub fn write_persona_list<W: Write>(out: &mut W, default: PersonaId) -> io::Result<()> {
    writeln!(out, "Available personas:\n")?;
    for id in PersonaId::ALL {
        let config = id.config();
        let marker = if id == default { " (default)" } else { "" };
        writeln!(
            out,
            "  {} {:<9} {} [{}]{}",
            config.style.glyph,
            id.as_str(),
            config.label,
            config.model_name,
            marker
        )?;
        writeln!(out, "      {}", config.description)?;
    }
    writeln!(out, "\n💡 Start a chat with a persona:")?;
    writeln!(out, "   polymind -p <persona>")?;
    Ok(())
}
