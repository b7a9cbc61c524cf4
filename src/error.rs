//! Domain errors and their HTTP mapping.
//!
//! Every error is rendered as `{"detail": "<message>"}` with the matching
//! status code. Internal errors are logged and answered with a generic body.

use actix_web::http::{header, StatusCode};
use actix_web::{HttpResponse, ResponseError};
use chrono::NaiveDate;
use serde_json::json;
use thiserror::Error;

use crate::config::settings;
use crate::datetime::{format_short, DateError};

fn date_range_label(start: &NaiveDate, end: &Option<NaiveDate>) -> String {
    let end = end.map(format_short).unwrap_or_else(|| "indefinido".into());
    format!("{} - {}", format_short(*start), end)
}

fn games_attached_message(count: &i64) -> String {
    if *count == 1 {
        "Existe 1 jogo nessa situação. Por favor, remova-o antes de tentar novamente.".into()
    } else {
        format!(
            "Existem {count} jogos nessa situação. Por favor, remova-os antes de tentar novamente."
        )
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed or inconsistent input (422)
    #[error("{0}")]
    Validation(String),

    // ---------- auth ----------
    #[error("Não foi possível validar o token de acesso")]
    InvalidAccessToken,
    #[error("Email ou senha incorretos")]
    IncorrectCredentials,
    #[error("Sessão expirada. Faça login novamente.")]
    InvalidRefreshToken,
    #[error("Invalid password")]
    InvalidAdminPassword,
    #[error("Usuário não possui permissão para essa ação.")]
    AdminRequired,
    #[error("Usuário não possui permissão de super administrador para essa ação.")]
    SuperAdminRequired,

    // ---------- user ----------
    #[error("Não é possível alterar outro usuário administrador.")]
    CantUpdateAdminUser,
    #[error("Não é possível remover o próprio usuário.")]
    CantDeleteYourself,
    #[error("Senha deve ter no máximo 72 caracteres")]
    PasswordTooLong,
    #[error("Já existe um usuário com este e-mail cadastrado neste time no sistema")]
    EmailAlreadyInUse,
    #[error("Usuário não encontrado no sistema")]
    UserNotFound,
    #[error("Jogador já está associado a outro usuário.")]
    PlayerAlreadyLinked,

    // ---------- team ----------
    #[error("Time não encontrado no sistema")]
    TeamNotFound,
    #[error("Já existe uma intenção de inscrição para este e-mail.")]
    IntentionAlreadyExists,

    // ---------- player ----------
    #[error("Jogador não encontrado no sistema")]
    PlayerNotFound,
    #[error("O número máximo de jogadores do time foi atingido. Atualize seu plano para adicionar mais jogadores.")]
    PlayersLimitReached,

    // ---------- championship ----------
    #[error("Campeonato não encontrado no sistema")]
    ChampionshipNotFound,
    #[error("Já existe um campeonato com este nome cadastrado no sistema")]
    ChampionshipAlreadyExists,
    #[error("A data de início não pode ser maior que a data de término.")]
    StartDateBiggerThanEnd,
    #[error("Fase final ou posição final exigem data de término.")]
    FinalAttributeWithoutEndDate,
    #[error("Campeonato no formato de liga não pode ter fase final.")]
    LeagueFormatCantHaveFinalStage,
    #[error("Campeonato no formato mata-mata não pode ter posição final.")]
    KnockOutCantHaveFinalPosition,
    #[error("Não é possível editar o campeonato {}", settings().friendly_championship_name)]
    CantEditFriendlyChampionship,
    #[error("Não é possível deletar o campeonato {}", settings().friendly_championship_name)]
    CantDeleteFriendlyChampionship,
    #[error("Não é possível deletar o campeonato {}", settings().before_system_championship_name)]
    CantDeleteBeforeSystemChampionship,
    #[error(
        "Só é possível editar a data de término do campeonato {}",
        settings().before_system_championship_name
    )]
    CanOnlyEditEndDateBeforeSystemChampionship,
    #[error(
        "Não é possível remover um campeonato com jogos atrelados a ele. {}",
        games_attached_message(.0)
    )]
    CantDeleteChampionshipWithGames(i64),

    // ---------- game & stats ----------
    #[error("Jogo não encontrado no sistema.")]
    GameNotFound,
    #[error("Etapa do jogo não compatível com tipo de campeonato (liga ou mata-mata).")]
    InvalidChampionshipFormat,
    #[error(
        "A data do jogo deve estar dentro da duração do campeonato ({}).",
        date_range_label(.start, .end)
    )]
    GameDateOutsideChampionshipRange {
        start: NaiveDate,
        end: Option<NaiveDate>,
    },
    #[error("Alguns jogadores selecionados não foram encontrados no sistema. Por favor entre em contato com o suporte.")]
    SomePlayersNotFound,
    #[error("Jogador selecionado para estatística não está entre os jogadores da partida.")]
    StatPlayerNotInGamePlayers,
    #[error("Quantidade de cartões amarelos não pode ser maior que 2.")]
    InvalidYellowCardsQuantity,
    #[error("Usuário precisa estar associado a um jogador para essa ação.")]
    UserNeedsAssociatedPlayer,
    #[error("Disponibilidade não encontrada no sistema")]
    AvailabilityNotFound,

    // ---------- misc ----------
    #[error("Termos de uso não encontrados.")]
    TermsNotFound,
    #[error("Erro ao salvar a imagem do emblema. Por favor, tente novamente.")]
    FailedUploadStorage,
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Forbidden(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<DateError> for AppError {
    fn from(e: DateError) -> Self {
        Self::Validation(e.to_string())
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        use AppError::*;
        match self {
            Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            InvalidAccessToken | IncorrectCredentials | InvalidRefreshToken
            | InvalidAdminPassword => StatusCode::UNAUTHORIZED,
            AdminRequired | SuperAdminRequired | CantUpdateAdminUser | Forbidden(_) => {
                StatusCode::FORBIDDEN
            }
            UserNotFound | TeamNotFound | PlayerNotFound | ChampionshipNotFound
            | AvailabilityNotFound | TermsNotFound => StatusCode::NOT_FOUND,
            FailedUploadStorage | Database(_) | Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let detail = match self {
            Self::Database(e) => {
                log::error!("database error: {e}");
                "Erro interno do servidor.".to_string()
            }
            Self::Internal(e) => {
                log::error!("internal error: {e:#}");
                "Erro interno do servidor.".to_string()
            }
            other => other.to_string(),
        };

        let mut builder = HttpResponse::build(status);
        if matches!(self, Self::InvalidAccessToken | Self::InvalidRefreshToken) {
            builder.insert_header((header::WWW_AUTHENTICATE, "Bearer"));
        }
        builder.json(json!({ "detail": detail }))
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_is_422() {
        let err = AppError::Validation("Can't have both stage and round".into());
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn permission_errors_are_403() {
        assert_eq!(AppError::AdminRequired.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::SuperAdminRequired.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn invalid_token_sets_www_authenticate() {
        let resp = AppError::InvalidAccessToken.error_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(resp.headers().get(header::WWW_AUTHENTICATE).unwrap(), "Bearer");
    }

    #[test]
    fn player_already_linked_is_400() {
        assert_eq!(AppError::PlayerAlreadyLinked.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn internal_errors_hide_details() {
        let err = AppError::Internal(anyhow::anyhow!("connection reset"));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "connection reset");
    }

    #[test]
    fn games_attached_message_is_pluralized() {
        assert_eq!(
            AppError::CantDeleteChampionshipWithGames(1).to_string(),
            "Não é possível remover um campeonato com jogos atrelados a ele. Existe 1 jogo nessa situação. Por favor, remova-o antes de tentar novamente."
        );
        assert!(AppError::CantDeleteChampionshipWithGames(3)
            .to_string()
            .contains("Existem 3 jogos nessa situação. Por favor, remova-os"));
    }

    #[test]
    fn game_date_message_marks_open_end() {
        let err = AppError::GameDateOutsideChampionshipRange {
            start: NaiveDate::from_ymd_opt(2022, 11, 20).unwrap(),
            end: None,
        };
        assert_eq!(
            err.to_string(),
            "A data do jogo deve estar dentro da duração do campeonato (20/11/22 - indefinido)."
        );
    }
}
