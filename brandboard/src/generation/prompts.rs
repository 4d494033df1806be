//! Prompt assembly for every generation step of the wizard.
//!
//! Prompts embed the accumulated context as serialized JSON and pin the
//! expected output format (fenced JSON or labeled lines) so the parser
//! strategies on the other side stay in sync with what is asked here.

use serde_json::{json, Value};

use crate::wizard::approval::{RefinementJob, RegenerateJob};
use crate::wizard::types::{CompanyCandidate, CompanyForm, IdeaForm, PartKind, ValidationData};

/// Candidate search over web/maps for an existing company.
pub fn company_search(form: &CompanyForm) -> String {
    format!(
        "Procure a empresa \"{}\" na cidade de {}. Liste até 5 correspondências.\n\
         Responda somente com um bloco ```json contendo um array de objetos com os campos:\n\
         id, companyName, address, websiteUrl, description e matchType.\n\
         matchType deve ser EXACT_IN_CITY (nome e cidade conferem), \
         CORRECT_NAME_OTHER_CITY (nome confere em outra cidade) ou SUGGESTION (aproximação).",
        form.name, form.city
    )
}

/// Free-text profile of a resolved candidate. The answer uses labeled
/// lines parsed by [`crate::parser::parse_company_info`].
pub fn full_company_info(candidate: &CompanyCandidate) -> String {
    format!(
        "Monte o perfil completo da empresa \"{}\" ({}). Pesquise na web e responda \
         em texto corrido com exatamente estes rótulos, um por linha:\n\
         Nome da Empresa:\nDescrição:\nEndereço:\nSite:\nResumo de Avaliações:\n\
         Redes Sociais:\nEstatísticas do Instagram:\n\
         Use a frase \"Não encontrado\" para qualquer campo sem informação.",
        candidate.company_name, candidate.address
    )
}

/// Concept expansion for a brand-new business idea.
pub fn idea_concept(form: &IdeaForm) -> String {
    format!(
        "A partir da ideia de negócio abaixo, escreva um conceito de marca inicial.\n\
         Nome: {}\nIdeia: {}\nPúblico-alvo: {}\n\
         Responda somente com um bloco ```json contendo os campos \
         companyName e description.",
        form.name, form.description, form.target_audience
    )
}

/// Grounded deep-dive on an existing company's market presence.
pub fn deep_analysis(validation: &ValidationData) -> String {
    format!(
        "Faça uma análise aprofundada da presença de mercado da empresa \"{}\".\n\
         Contexto já validado:\n{}\n\
         Pesquise na web, cite as fontes e escreva um texto analítico sobre \
         posicionamento, concorrência e reputação.",
        validation.company_name,
        serde_json::to_string_pretty(&validation).unwrap_or_default()
    )
}

/// Analysis of an uploaded logo image.
pub fn logo_analysis(company_name: &str, logo_reference: &str) -> String {
    format!(
        "Analise o logotipo da empresa \"{}\" disponível em {}. Descreva estilo, \
         cores predominantes e a personalidade que ele transmite, em um parágrafo.",
        company_name, logo_reference
    )
}

/// Generation of one brandboard part given everything accumulated so far.
pub fn part_generation(kind: PartKind, context: &Value) -> String {
    let fields: Vec<&str> = kind.topics().iter().map(|t| t.key).collect();
    format!(
        "Você está montando o marketingboard de uma marca, seção \"{}\".\n\
         Contexto acumulado:\n{}\n\
         Responda somente com um bloco ```json contendo um objeto com os campos: {}.",
        kind.title(),
        context,
        fields.join(", ")
    )
}

/// Minimal structured-output schema for a part: an object naming each
/// declared topic key.
pub fn part_schema(kind: PartKind) -> Value {
    let mut properties = serde_json::Map::new();
    for topic in kind.topics() {
        properties.insert(topic.key.to_string(), json!({}));
    }
    json!({
        "type": "object",
        "properties": properties,
    })
}

/// Cascade refinement: rewrite the not-yet-approved downstream topics so
/// they stay consistent with a topic the user just locked in.
pub fn refinement(job: &RefinementJob) -> String {
    format!(
        "Na seção \"{}\" do marketingboard, o usuário aprovou o campo \"{}\" com o valor:\n{}\n\
         Contexto completo da marca:\n{}\n\
         Reescreva apenas os campos abaixo para que fiquem coerentes com a decisão aprovada, \
         mantendo o espírito dos valores atuais:\n{}\n\
         Responda somente com um bloco ```json contendo um objeto com exatamente esses campos.",
        job.part.title(),
        job.approved_key,
        job.approved_value,
        job.context,
        Value::Object(job.targets.clone())
    )
}

/// Single-topic rewrite driven by a user comment.
pub fn regenerate(job: &RegenerateJob) -> String {
    format!(
        "Na seção \"{}\" do marketingboard, reescreva o campo \"{}\".\n\
         Valor atual:\n{}\n\
         Instruções do usuário: {}\n\
         Responda somente com o novo valor, em um bloco ```json quando for estruturado.",
        job.part.title(),
        job.key,
        job.current,
        job.comment
    )
}
