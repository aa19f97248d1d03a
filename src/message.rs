use bytes::{Bytes, BytesMut};
use tracing::instrument;

use super::{Flags, Header, Networkable, Question, ResourceRecord};
use crate::{DnsError, WireCursor};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Message {
    pub header: Header,
    pub questions: Vec<Question>,
    pub answers: Vec<ResourceRecord>,
    pub authorities: Vec<ResourceRecord>,
    pub additionals: Vec<ResourceRecord>,
}

impl Message {
    pub fn new(header: Header) -> Self {
        Self {
            header,
            ..Default::default()
        }
    }

    /// An outbound query with a random id and recursion desired.
    pub fn new_query(questions: Vec<Question>) -> Self {
        let mut flags = Flags::default();
        flags.set_rd(true);

        let mut query = Self::new(Header::new(rand::random::<u16>(), flags));
        for question in questions {
            query.add_question(question);
        }

        query
    }

    pub fn add_question(&mut self, question: Question) {
        self.header.num_questions += 1;
        self.questions.push(question)
    }

    pub fn add_answer(&mut self, answer: ResourceRecord) {
        self.header.num_answers += 1;
        self.answers.push(answer)
    }

    pub fn add_authority(&mut self, answer: ResourceRecord) {
        self.header.num_authorities += 1;
        self.authorities.push(answer)
    }

    pub fn add_additional(&mut self, answer: ResourceRecord) {
        self.header.num_additionals += 1;
        self.additionals.push(answer)
    }
}

impl Networkable for Message {
    /// Section counts are always written from the section lengths.
    #[instrument(level = "debug", skip_all)]
    fn to_bytes(&self) -> Result<Bytes, DnsError> {
        let header = Header {
            num_questions: section_count("question", self.questions.len())?,
            num_answers: section_count("answer", self.answers.len())?,
            num_authorities: section_count("authority", self.authorities.len())?,
            num_additionals: section_count("additional", self.additionals.len())?,
            ..self.header.clone()
        };

        let mut response = BytesMut::new();
        response.extend_from_slice(&header.to_bytes()?);

        for question in self.questions.iter() {
            response.extend_from_slice(&question.to_bytes()?);
        }

        for record in self
            .answers
            .iter()
            .chain(self.authorities.iter())
            .chain(self.additionals.iter())
        {
            response.extend_from_slice(&record.to_bytes()?);
        }

        Ok(response.into())
    }

    #[instrument(level = "debug", skip_all)]
    fn from_bytes(bytes: &mut WireCursor<'_>) -> Result<Self, DnsError> {
        let header = Header::from_bytes(bytes)?;

        let mut questions = Vec::new();
        for _ in 0..header.num_questions {
            questions.push(Question::from_bytes(bytes)?);
        }

        let mut answers = Vec::new();
        for _ in 0..header.num_answers {
            answers.push(ResourceRecord::from_bytes(bytes)?);
        }

        let mut authorities = Vec::new();
        for _ in 0..header.num_authorities {
            authorities.push(ResourceRecord::from_bytes(bytes)?);
        }

        let mut additionals = Vec::new();
        for _ in 0..header.num_additionals {
            additionals.push(ResourceRecord::from_bytes(bytes)?);
        }

        Ok(Self {
            header,
            questions,
            answers,
            authorities,
            additionals,
        })
    }
}

fn section_count(section: &'static str, count: usize) -> Result<u16, DnsError> {
    u16::try_from(count).map_err(|_| DnsError::SectionTooLarge { section, count })
}
