//! Enumerations shared by the API payloads and the stored rows.
//!
//! Values are persisted as text; `as_str` gives the stored form and
//! `FromStr` reads it back.

use serde::{Deserialize, Serialize};

macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(format!("unknown {}: {other}", stringify!($name))),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

text_enum! {
    /// Knockout stages, also used as a championship's final stage.
    StageOption {
        FaseDeGrupos => "fase_de_grupos",
        Triangular => "triangular",
        Repescagem => "repescagem",
        DecimaSextasDeFinal => "decima_sextas_de_final",
        OitavasDeFinal => "oitavas_de_final",
        QuartasDeFinal => "quartas_de_final",
        SemiFinal => "semi_final",
        Final => "final",
        ViceCampeao => "vice_campeao",
        Campeao => "campeao",
    }
}

text_enum! {
    PlayerPosition {
        Goleiro => "Goleiro",
        Zagueiro => "Zagueiro",
        Lateral => "Lateral",
        LateralDireito => "Lateral-direito",
        LateralEsquerdo => "Lateral-esquerdo",
        MeioCampo => "Meio-campo",
        Volante => "Volante",
        MeiaDireita => "Meia-direita",
        MeiaEsquerda => "Meia-esquerda",
        Atacante => "Atacante",
        Ponta => "Ponta",
        PontaDireita => "Ponta-direita",
        PontaEsquerda => "Ponta-esquerda",
        Fixo => "Fixo",
        Ala => "Ala",
        Pivo => "Pivô",
    }
}

text_enum! {
    /// Kind of a `game_player_stats` row.
    StatKind {
        Played => "played",
        Goal => "goal",
        Assist => "assist",
        YellowCard => "yellow_card",
        RedCard => "red_card",
        Mvp => "mvp",
    }
}

text_enum! {
    AvailabilityStatus {
        Available => "available",
        NotAvailable => "not_available",
        Doubt => "doubt",
    }
}

text_enum! {
    ChampionshipStatus {
        NaoIniciado => "não iniciado",
        EmAndamento => "em andamento",
        Finalizado => "finalizado",
    }
}

text_enum! {
    ChampionshipFormat {
        Knockout => "knockout",
        League => "league",
    }
}

text_enum! {
    GameResult {
        Win => "win",
        Loss => "loss",
        Draw => "draw",
        Pending => "pending",
    }
}

impl Default for StatKind {
    fn default() -> Self {
        StatKind::Goal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn stored_text_round_trips() {
        for position in PlayerPosition::ALL {
            assert_eq!(PlayerPosition::from_str(position.as_str()).unwrap(), *position);
        }
        assert_eq!(PlayerPosition::Pivo.as_str(), "Pivô");
    }

    #[test]
    fn serde_uses_stored_text() {
        let json = serde_json::to_string(&ChampionshipStatus::NaoIniciado).unwrap();
        assert_eq!(json, "\"não iniciado\"");
        let stage: StageOption = serde_json::from_str("\"semi_final\"").unwrap();
        assert_eq!(stage, StageOption::SemiFinal);
    }

    #[test]
    fn unknown_text_is_rejected() {
        assert!(StatKind::from_str("own_goal").is_err());
    }
}
